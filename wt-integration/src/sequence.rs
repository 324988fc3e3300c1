use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Monotonically increasing event sequence. Used to track `Engine` event
/// processing order (ties are broken by arrival order) and to give the
/// replayer a deterministic total order for events emitted within a
/// single cursor advance.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct Sequence(pub u64);

impl Sequence {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn fetch_add(&mut self) -> Sequence {
        let sequence = *self;
        self.0 += 1;
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_add_returns_pre_increment_value() {
        let mut seq = Sequence(5);
        assert_eq!(seq.fetch_add(), Sequence(5));
        assert_eq!(seq, Sequence(6));
    }
}
