use crate::statistic::algorithm::welford_online;
use crate::statistic::metric::drawdown::max::{MaxDrawdown, MaxDrawdownGenerator};
use crate::statistic::metric::drawdown::mean::{MeanDrawdown, MeanDrawdownGenerator};
use crate::statistic::metric::drawdown::DrawdownGenerator;
use crate::statistic::metric::{CalmarRatio, ProfitFactor, RateOfReturn, SharpeRatio, SortinoRatio, WinRate};
use crate::statistic::time::TimeInterval;
use crate::Timed;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wt_strategy::CloseLog;

/// Win-rate, ratio, and drawdown summary for one strategy context over
/// its full run, dumped as the `statistics` section of a context's
/// `{name}.json` output file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TradingSummary<Interval> {
    pub trade_count: u64,
    pub win_rate: Option<WinRate>,
    pub profit_factor: Option<ProfitFactor>,
    pub rate_of_return: RateOfReturn<Interval>,
    pub sharpe_ratio: SharpeRatio<Interval>,
    pub sortino_ratio: SortinoRatio<Interval>,
    pub calmar_ratio: CalmarRatio<Interval>,
    pub max_drawdown: Option<MaxDrawdown>,
    pub mean_drawdown: Option<MeanDrawdown>,
    pub pnl: f64,
    pub total_fees: f64,
}

/// Incremental generator consuming a context's [`CloseLog`]s (for
/// win-rate and profit factor) and dynamic-balance equity curve (for
/// return and drawdown metrics), one point at a time so it can run
/// alongside a live or backtest session without retaining full history.
#[derive(Debug, Clone)]
pub struct TradingSummaryGenerator {
    risk_free_return: f64,
    wins: Decimal,
    losses: Decimal,
    trade_count: u64,
    profit_gross: Decimal,
    loss_gross: Decimal,
    total_fees: f64,
    equity_first: f64,
    equity_last: f64,
    return_mean: f64,
    return_variance_m: f64,
    downside_variance_m: f64,
    return_count: u64,
    drawdown: Option<DrawdownGenerator>,
    max_drawdown: MaxDrawdownGenerator,
    mean_drawdown: MeanDrawdownGenerator,
}

impl TradingSummaryGenerator {
    /// Starts a new generator seeded with the context's opening dynamic
    /// balance.
    pub fn init(risk_free_return: f64, opening_equity: Timed<f64>) -> Self {
        Self {
            risk_free_return,
            wins: Decimal::ZERO,
            losses: Decimal::ZERO,
            trade_count: 0,
            profit_gross: Decimal::ZERO,
            loss_gross: Decimal::ZERO,
            total_fees: 0.0,
            equity_first: opening_equity.value,
            equity_last: opening_equity.value,
            return_mean: 0.0,
            return_variance_m: 0.0,
            downside_variance_m: 0.0,
            return_count: 0,
            drawdown: Some(DrawdownGenerator::init(opening_equity)),
            max_drawdown: MaxDrawdownGenerator::default(),
            mean_drawdown: MeanDrawdownGenerator::default(),
        }
    }

    /// Folds one [`CloseLog`] into the win/loss and profit-factor
    /// tallies.
    pub fn record_close(&mut self, close: &CloseLog) {
        self.trade_count += 1;
        self.total_fees += close.fee;

        let profit = Decimal::try_from(close.profit).unwrap_or_default();
        if close.profit > 0.0 {
            self.wins += Decimal::ONE;
            self.profit_gross += profit;
        } else if close.profit < 0.0 {
            self.losses += Decimal::ONE;
            self.loss_gross += -profit;
        }
    }

    /// Folds one dynamic-balance observation into the return and
    /// drawdown generators. Called once per trading day, matching the
    /// row cadence of a context's `funds.csv` output.
    pub fn record_equity(&mut self, point: Timed<f64>) {
        if self.equity_last != 0.0 {
            let ret = (point.value - self.equity_last) / self.equity_last;
            self.return_count += 1;
            let prev_mean = self.return_mean;
            self.return_mean = welford_online::calculate_mean(prev_mean, ret, self.return_count as f64);
            self.return_variance_m += (ret - prev_mean) * (ret - self.return_mean);
            if ret < 0.0 {
                self.downside_variance_m += (ret - prev_mean) * (ret - self.return_mean);
            }
        }
        self.equity_last = point.value;

        let Some(generator) = self.drawdown.as_mut() else {
            self.drawdown = Some(DrawdownGenerator::init(point));
            return;
        };

        if let Some(ended) = generator.update(point) {
            self.max_drawdown.update(&ended);
            self.mean_drawdown.update(&ended);
        }
    }

    fn return_std_dev(&self) -> f64 {
        if self.return_count < 2 {
            0.0
        } else {
            (self.return_variance_m / (self.return_count - 1) as f64).sqrt()
        }
    }

    fn downside_std_dev(&self) -> f64 {
        if self.return_count < 2 {
            0.0
        } else {
            (self.downside_variance_m.max(0.0) / (self.return_count - 1) as f64).sqrt()
        }
    }

    fn current_drawdown_magnitude(&self) -> f64 {
        self.max_drawdown
            .generate()
            .map(|max| max.0.value.abs())
            .or_else(|| self.drawdown.as_ref().and_then(|g| g.generate()).map(|d| d.value.abs()))
            .unwrap_or(0.0)
    }

    /// Snapshots the [`TradingSummary`] accumulated so far, expressed
    /// over the given [`TimeInterval`] (the cadence `record_equity` is
    /// fed at, eg/ [`Daily`](crate::statistic::time::Daily)).
    pub fn generate<Interval>(&self, interval: Interval) -> TradingSummary<Interval>
    where
        Interval: TimeInterval,
    {
        let win_rate = WinRate::calculate(self.wins, self.wins + self.losses);
        let profit_factor = ProfitFactor::calculate(self.profit_gross, self.loss_gross);

        let mean_return = Decimal::try_from(self.return_mean).unwrap_or_default();
        let rate_of_return = RateOfReturn::calculate(mean_return, interval);
        let sharpe_ratio = SharpeRatio::calculate(self.risk_free_return, self.return_mean, self.return_std_dev(), interval);
        let sortino_ratio = SortinoRatio::calculate(self.risk_free_return, self.return_mean, self.downside_std_dev(), interval);
        let calmar_ratio = CalmarRatio::calculate(self.risk_free_return, self.return_mean, self.current_drawdown_magnitude(), interval);

        TradingSummary {
            trade_count: self.trade_count,
            win_rate,
            profit_factor,
            rate_of_return,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            max_drawdown: self.max_drawdown.generate(),
            mean_drawdown: self.mean_drawdown.generate(),
            pnl: self.equity_last - self.equity_first,
            total_fees: self.total_fees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistic::time::Daily;
    use crate::test_utils::time_plus_days;
    use chrono::{DateTime, Utc};
    use wt_execution::order::Direction;

    fn close(profit: f64) -> CloseLog {
        CloseLog {
            code: "rb2410".into(),
            direction: Direction::Long,
            open_price: 3500.0,
            close_price: 3500.0 + profit,
            volume: 1,
            profit,
            fee: 2.0,
            max_profit: profit.max(0.0),
            max_loss: profit.min(0.0),
            open_time: 90_000_000,
            close_time: 93_000_000,
            enter_tag: "s1".into(),
            exit_tag: "s1".into(),
            total_profit: profit,
        }
    }

    #[test]
    fn win_rate_and_profit_factor_fold_closed_trades() {
        let base = DateTime::<Utc>::MIN_UTC;
        let mut generator = TradingSummaryGenerator::init(0.0, Timed::new(100_000.0, base));
        generator.record_close(&close(100.0));
        generator.record_close(&close(-40.0));
        generator.record_close(&close(60.0));

        let summary = generator.generate(Daily);
        assert_eq!(summary.trade_count, 3);
        assert_eq!(summary.win_rate.unwrap().value, Decimal::new(2, 0) / Decimal::new(3, 0));
        assert_eq!(summary.total_fees, 6.0);
    }

    #[test]
    fn equity_curve_feeds_drawdown_and_pnl() {
        let base = DateTime::<Utc>::MIN_UTC;
        let mut generator = TradingSummaryGenerator::init(0.0, Timed::new(100_000.0, base));

        generator.record_equity(Timed::new(110_000.0, time_plus_days(base, 1)));
        generator.record_equity(Timed::new(99_000.0, time_plus_days(base, 2)));
        generator.record_equity(Timed::new(115_000.0, time_plus_days(base, 3)));

        let summary = generator.generate(Daily);
        assert!(summary.max_drawdown.is_some());
        assert_eq!(summary.pnl, 15_000.0);
    }

    #[test]
    fn no_trades_yields_no_win_rate_or_profit_factor() {
        let base = DateTime::<Utc>::MIN_UTC;
        let generator = TradingSummaryGenerator::init(0.0, Timed::new(100_000.0, base));
        let summary = generator.generate(Daily);
        assert!(summary.win_rate.is_none());
        assert!(summary.profit_factor.is_none());
        assert_eq!(summary.trade_count, 0);
    }
}
