use crate::statistic::time::TimeInterval;
use rust_decimal::prelude::Zero;
use serde::{Deserialize, Serialize};

/// Like [`SharpeRatio`](super::SharpeRatio), but divides excess equity
/// return by downside deviation only (the standard deviation of the
/// negative `record_equity` samples), so an upside-only run is not
/// penalised for volatility that never hurt the account.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct SortinoRatio<Interval> {
    pub value: f64,
    pub interval: Interval,
}

impl<Interval> SortinoRatio<Interval>
where
    Interval: TimeInterval,
{
    /// Calculate the [`SortinoRatio`] over the provided [`TimeInterval`].
    pub fn calculate(
        risk_free_return: f64,
        mean_return: f64,
        std_dev_loss_returns: f64,
        returns_period: Interval,
    ) -> Self {
        if std_dev_loss_returns.is_zero() {
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
                value: (mean_return - risk_free_return) / std_dev_loss_returns,
                interval: returns_period,
            }
        }
    }

    /// Re-express the [`SortinoRatio`] over a different [`TimeInterval`].
    /// Scaling assumes IID returns, which is a weaker assumption here
    /// than for [`SharpeRatio`](super::SharpeRatio) since downside
    /// deviation does not necessarily scale with the square root of time.
    pub fn scale<TargetInterval>(self, target: TargetInterval) -> SortinoRatio<TargetInterval>
    where
        TargetInterval: TimeInterval,
    {
        let scale = (target.interval().num_seconds() as f64
            / self.interval.interval().num_seconds() as f64)
            .sqrt();

        SortinoRatio {
            value: self.value * scale,
            interval: target,
        }
    }
}
