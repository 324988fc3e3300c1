use crate::statistic::time::TimeInterval;
use rust_decimal::prelude::Zero;
use serde::{Deserialize, Serialize};

/// Risk-adjusted daily-equity-return ratio over a specific
/// [`TimeInterval`]: excess return (over `risk_free_return`) divided by
/// the standard deviation of the context's `record_equity` samples.
///
/// See docs: <https://www.investopedia.com/articles/07/sharpe_ratio.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct SharpeRatio<Interval> {
    pub value: f64,
    pub interval: Interval,
}

impl<Interval> SharpeRatio<Interval>
where
    Interval: TimeInterval,
{
    /// Calculate the [`SharpeRatio`] from a context's mean equity return
    /// and its standard deviation over the provided [`TimeInterval`].
    pub fn calculate(
        risk_free_return: f64,
        mean_return: f64,
        std_dev_returns: f64,
        returns_period: Interval,
    ) -> Self {
        if std_dev_returns.is_zero() {
            Self {
                value: f64::INFINITY,
                interval: returns_period,
            }
        } else {
            Self {
                value: (mean_return - risk_free_return) / std_dev_returns,
                interval: returns_period,
            }
        }
    }

    /// Re-express the [`SharpeRatio`] over a different [`TimeInterval`]
    /// (eg/ daily equity samples scaled up to an annualised figure),
    /// assuming the underlying returns are IID.
    pub fn scale<TargetInterval>(self, target: TargetInterval) -> SharpeRatio<TargetInterval>
    where
        TargetInterval: TimeInterval,
    {
        let scale = (target.interval().num_seconds() as f64
            / self.interval.interval().num_seconds() as f64)
            .sqrt();

        SharpeRatio {
            value: self.value * scale,
            interval: target,
        }
    }
}
