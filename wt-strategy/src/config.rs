use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a fill's reported price is adjusted away from the trigger price
/// before it's booked: sign is `+1` for buys, `-1` for sells.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum SlippageMode {
    /// Fixed number of `price_tick`s.
    Absolute(i32),
    /// Basis points of the trigger price, rounded to the nearest tick.
    Ratio(f64),
}

impl Default for SlippageMode {
    fn default() -> Self {
        SlippageMode::Absolute(0)
    }
}

impl SlippageMode {
    /// Applies the configured slippage to `trade_price`, `sign` is `1.0`
    /// for a buy and `-1.0` for a sell.
    pub fn apply(self, trade_price: f64, price_tick: f64, sign: f64) -> f64 {
        match self {
            SlippageMode::Absolute(ticks) => trade_price + sign * ticks as f64 * price_tick,
            SlippageMode::Ratio(bps) => {
                let raw = bps * trade_price / 10_000.0;
                let rounded = (raw / price_tick).round() * price_tick;
                trade_price + sign * rounded
            }
        }
    }
}

/// Commission schedule, split by open/close since many Chinese futures
/// products charge a reduced (or zero) rate on same-day closes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct FeeSchedule {
    pub open_rate: f64,
    pub close_rate: f64,
    pub close_today_rate: f64,
    pub minimum: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self { open_rate: 0.0, close_rate: 0.0, close_today_rate: 0.0, minimum: 0.0 }
    }
}

impl FeeSchedule {
    pub fn open_fee(&self, turnover: f64) -> f64 {
        (turnover * self.open_rate).max(self.minimum)
    }

    pub fn close_fee(&self, turnover: f64, is_today: bool) -> f64 {
        let rate = if is_today { self.close_today_rate } else { self.close_rate };
        (turnover * rate).max(self.minimum)
    }
}

/// How a context's `user_data` KV store is flushed to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PersistenceMode {
    /// Write `{name}.json` once, when the context is torn down.
    OnSessionEnd,
    /// Write `{name}.json` after every `stra_save_user_data` call —
    /// costlier, but survives a crash mid-session.
    OnEveryWrite,
}

impl Default for PersistenceMode {
    fn default() -> Self {
        PersistenceMode::OnSessionEnd
    }
}

/// Strategy-context configuration, serde-deserialized from the engine's
/// config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    pub context_id: String,
    #[serde(default)]
    pub slippage: SlippageMode,
    #[serde(default)]
    pub fees: FeeSchedule,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub persistence: PersistenceMode,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            context_id: String::new(),
            slippage: SlippageMode::default(),
            fees: FeeSchedule::default(),
            output_dir: PathBuf::from("outputs"),
            persistence: PersistenceMode::default(),
        }
    }
}

impl StrategyConfig {
    /// Resolves the `outputs/{name}/` directory a context writes to.
    pub fn strategy_output_dir(&self) -> PathBuf {
        self.output_dir.join(&self.context_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_slippage_moves_price_by_fixed_ticks() {
        let mode = SlippageMode::Absolute(2);
        assert_eq!(mode.apply(3500.0, 1.0, 1.0), 3502.0);
        assert_eq!(mode.apply(3500.0, 1.0, -1.0), 3498.0);
    }

    #[test]
    fn ratio_slippage_rounds_to_nearest_tick() {
        let mode = SlippageMode::Ratio(10.0); // 10 bps
        // 3500 * 10 / 10000 = 3.5, rounds to 4 at a 1-point tick.
        assert_eq!(mode.apply(3500.0, 1.0, 1.0), 3504.0);
    }

    #[test]
    fn fee_schedule_respects_minimum() {
        let fees = FeeSchedule { open_rate: 0.0001, close_rate: 0.0001, close_today_rate: 0.0, minimum: 5.0 };
        assert_eq!(fees.open_fee(1000.0), 5.0);
        assert_eq!(fees.close_fee(1_000_000.0, false), 100.0);
        assert_eq!(fees.close_fee(1_000_000.0, true), 5.0);
    }
}
