use crate::exchange::{Code, Exchange, full_code};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Exchange rule for how a close-position order must be split against
/// same-day vs. prior-day lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum CoverMode {
    /// Positions may only be opened, never closed directly (rare; used
    /// for some option/future combos).
    OpenOnly,
    /// Closing must distinguish today's lots from yesterday's lots
    /// (CTP-style `CloseToday`/`CloseYesterday` split).
    CloseToday,
    /// Any lot may be used to close, FIFO order doesn't matter to the
    /// exchange (it still matters to our own P&L accounting).
    CoverAny,
}

/// Static, immutable-for-the-process-lifetime description of a tradable
/// contract.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContractInfo {
    pub exchange: Exchange,
    pub code: Code,
    pub product: SmolStr,
    pub price_tick: f64,
    pub volume_scale: f64,
    pub margin_rate: f64,
    pub fee_rate: f64,
    pub session_id: SmolStr,
    pub cover_mode: CoverMode,
    /// T+1: a position opened today cannot be closed today (equities).
    pub t_plus_1: bool,
    pub can_short: bool,
    /// Holiday-template name used for trading-date arithmetic.
    pub holiday_template: SmolStr,
}

impl ContractInfo {
    pub fn full_code(&self) -> SmolStr {
        full_code(&self.exchange, &self.code)
    }

    /// Rounds a raw price to the nearest valid `price_tick`, which is
    /// required before a fill price can be logged or sent to a broker.
    pub fn round_to_tick(&self, price: f64) -> f64 {
        if self.price_tick <= 0.0 {
            return price;
        }
        (price / self.price_tick).round() * self.price_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContractInfo {
        ContractInfo {
            exchange: Exchange::new("SHFE"),
            code: Code::new("au2406"),
            product: SmolStr::new("au"),
            price_tick: 0.05,
            volume_scale: 1000.0,
            margin_rate: 0.08,
            fee_rate: 0.0,
            session_id: SmolStr::new("FUT"),
            cover_mode: CoverMode::CoverAny,
            t_plus_1: false,
            can_short: true,
            holiday_template: SmolStr::new("CN"),
        }
    }

    #[test]
    fn full_code_is_exchange_dot_code() {
        assert_eq!(sample().full_code().as_str(), "SHFE.au2406");
    }

    #[test]
    fn round_to_tick_snaps() {
        let c = sample();
        assert_eq!(c.round_to_tick(400.03), 400.05);
        assert_eq!(c.round_to_tick(400.02), 400.0);
    }
}
