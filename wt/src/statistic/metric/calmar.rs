use crate::statistic::time::TimeInterval;
use rust_decimal::prelude::Zero;
use serde::{Deserialize, Serialize};

/// Risk-adjusted equity return ratio that divides excess return (over
/// `risk_free_return`) by [`MaxDrawdown`](super::drawdown::max::MaxDrawdown)
/// magnitude instead of standard deviation, so a context that has never
/// drawn down is rewarded differently than one that merely has low
/// day-to-day variance.
///
/// See docs: <https://corporatefinanceinstitute.com/resources/career-map/sell-side/capital-markets/calmar-ratio/>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct CalmarRatio<Interval> {
    pub value: f64,
    pub interval: Interval,
}

impl<Interval> CalmarRatio<Interval>
where
    Interval: TimeInterval,
{
    /// Calculate the [`CalmarRatio`] over the provided [`TimeInterval`].
    pub fn calculate(
        risk_free_return: f64,
        mean_return: f64,
        max_drawdown: f64,
        returns_period: Interval,
    ) -> Self {
        if max_drawdown.is_zero() {
            Self {
                value: match mean_return.partial_cmp(&risk_free_return) {
                    Some(std::cmp::Ordering::Greater) => f64::INFINITY,
                    Some(std::cmp::Ordering::Less) => f64::NEG_INFINITY,
                    _ => 0.0,
                },
                interval: returns_period,
            }
        } else {
            Self {
                value: (mean_return - risk_free_return) / max_drawdown.abs(),
                interval: returns_period,
            }
        }
    }

    /// Re-express the [`CalmarRatio`] over a different [`TimeInterval`].
    pub fn scale<TargetInterval>(self, target: TargetInterval) -> CalmarRatio<TargetInterval>
    where
        TargetInterval: TimeInterval,
    {
        let scale = (target.interval().num_seconds() as f64
            / self.interval.interval().num_seconds() as f64)
            .sqrt();

        CalmarRatio {
            value: self.value * scale,
            interval: target,
        }
    }
}
