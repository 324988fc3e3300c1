use crate::statistic::time::TimeInterval;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Mean equity return of a context over a specific [`TimeInterval`],
/// fed by the same `record_equity` samples that drive the drawdown and
/// ratio metrics. Unlike the risk-adjusted ratios, this scales linearly
/// with time rather than by the square root of time.
///
/// See docs: <https://www.investopedia.com/terms/r/rateofreturn.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct RateOfReturn<Interval> {
    pub value: Decimal,
    pub interval: Interval,
}

impl<Interval> RateOfReturn<Interval>
where
    Interval: TimeInterval,
{
    /// Wrap the mean equity return for the provided [`TimeInterval`].
    pub fn calculate(mean_return: Decimal, returns_period: Interval) -> Self {
        Self {
            value: mean_return,
            interval: returns_period,
        }
    }

    /// Re-express the [`RateOfReturn`] over a different [`TimeInterval`]
    /// via linear (simple-interest) scaling, eg/ a 1% daily return scales
    /// to ~252% annual, not sqrt(252)%.
    pub fn scale<TargetInterval>(self, target: TargetInterval) -> RateOfReturn<TargetInterval>
    where
        TargetInterval: TimeInterval,
    {
        let target_secs = Decimal::from(target.interval().num_seconds());
        let current_secs = Decimal::from(self.interval.interval().num_seconds());

        let scale = target_secs
            .abs()
            .checked_div(current_secs.abs())
            .unwrap_or(Decimal::MAX);

        RateOfReturn {
            value: self.value.checked_mul(scale).unwrap_or(Decimal::MAX),
            interval: target,
        }
    }
}
