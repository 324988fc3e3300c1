use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::sync::atomic::{AtomicU32, Ordering};

/// A strategy-facing order id: monotonic per adapter, assigned the
/// moment an order is accepted for emission. Brokers never see this
/// value directly.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct LocalOrderId(pub u32);

/// Hands out [`LocalOrderId`]s in increasing order for the lifetime of
/// one adapter instance.
#[derive(Debug, Default)]
pub struct LocalOrderIdGenerator(AtomicU32);

impl LocalOrderIdGenerator {
    pub fn next(&self) -> LocalOrderId {
        LocalOrderId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// The broker's own order identifier, eg/ a CTP-style
/// `{front_id}#{session_id}#{order_ref}` composite.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct BrokerOrderId(pub SmolStr);

impl BrokerOrderId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_hands_out_increasing_ids() {
        let generator = LocalOrderIdGenerator::default();
        assert_eq!(generator.next(), LocalOrderId(1));
        assert_eq!(generator.next(), LocalOrderId(2));
        assert_eq!(generator.next(), LocalOrderId(3));
    }
}
