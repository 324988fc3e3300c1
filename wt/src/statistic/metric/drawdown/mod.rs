use crate::Timed;
use chrono::{DateTime, TimeDelta, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

pub mod max;
pub mod mean;

/// Peak-to-trough decline of a context's `record_equity` curve over a
/// single drawdown period, closed out once equity recovers back above
/// the prior peak. `value` is a positive fraction of the peak
/// (`(peak - trough) / peak`), never the raw PnL delta.
///
/// See documentation: <https://www.investopedia.com/terms/d/drawdown.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize, Constructor)]
pub struct Drawdown {
    pub value: f64,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
}

impl Drawdown {
    /// Time period of the [`Drawdown`], from the previous peak to the
    /// instant it was recovered.
    pub fn duration(&self) -> TimeDelta {
        self.time_end.signed_duration_since(self.time_start)
    }
}

/// Streaming generator that turns successive `record_equity` samples
/// into closed [`Drawdown`] periods, one sample at a time, without
/// retaining the full equity history.
///
/// See documentation: <https://www.investopedia.com/terms/d/drawdown.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize, Constructor)]
pub struct DrawdownGenerator {
    pub peak: f64,
    pub drawdown_max: f64,
    pub time_peak: DateTime<Utc>,
    pub time_now: DateTime<Utc>,
}

impl DrawdownGenerator {
    /// Seed a [`DrawdownGenerator`] from the context's opening equity
    /// sample.
    pub fn init(point: Timed<f64>) -> Self {
        Self {
            peak: point.value,
            drawdown_max: 0.0,
            time_peak: point.time,
            time_now: point.time,
        }
    }

    /// Fold the latest equity sample in. Returns `Some(Drawdown)` once
    /// equity recovers above the peak that started the current drawdown
    /// period (the period has ended); `None` while still tracking a new
    /// high or still underwater.
    pub fn update(&mut self, point: Timed<f64>) -> Option<Drawdown> {
        self.time_now = point.time;

        if point.value > self.peak {
            // A new high only closes out a drawdown period if one was
            // actually open - if equity only ever rose, there's nothing to emit.
            let ended_drawdown = self.generate();

            self.peak = point.value;
            self.drawdown_max = 0.0;
            self.time_peak = point.time;

            ended_drawdown
        } else {
            let drawdown_current = (self.peak - point.value) / self.peak;

            if drawdown_current > self.drawdown_max {
                self.drawdown_max = drawdown_current;
            }

            None
        }
    }

    /// Current [`Drawdown`] as of this instant, if one is open.
    pub fn generate(&self) -> Option<Drawdown> {
        (self.drawdown_max != 0.0).then_some(Drawdown {
            value: self.drawdown_max,
            time_start: self.time_peak,
            time_end: self.time_now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::time_plus_days;

    struct Case {
        input: Timed<f64>,
        expected_state: DrawdownGenerator,
        expected_output: Option<Drawdown>,
    }

    #[test]
    fn update_tracks_a_full_equity_curve_through_drawdown_and_recovery() {
        let time_base = DateTime::<Utc>::MIN_UTC;

        let mut generator = DrawdownGenerator {
            peak: 100.0,
            drawdown_max: 0.0,
            time_peak: time_base,
            time_now: time_base,
        };

        let cases = vec![
            // new equity high, no drawdown open
            Case {
                input: Timed::new(110.0, time_plus_days(time_base, 1)),
                expected_state: DrawdownGenerator {
                    peak: 110.0,
                    drawdown_max: 0.0,
                    time_peak: time_plus_days(time_base, 1),
                    time_now: time_plus_days(time_base, 1),
                },
                expected_output: None,
            },
            // equity dips below the peak, drawdown opens
            Case {
                input: Timed::new(99.0, time_plus_days(time_base, 2)),
                expected_state: DrawdownGenerator {
                    peak: 110.0,
                    drawdown_max: 0.1, // (110-99)/110
                    time_peak: time_plus_days(time_base, 1),
                    time_now: time_plus_days(time_base, 2),
                },
                expected_output: None,
            },
            // deeper dip, drawdown widens
            Case {
                input: Timed::new(88.0, time_plus_days(time_base, 3)),
                expected_state: DrawdownGenerator {
                    peak: 110.0,
                    drawdown_max: 0.2, // (110-88)/110
                    time_peak: time_plus_days(time_base, 1),
                    time_now: time_plus_days(time_base, 3),
                },
                expected_output: None,
            },
            // partial bounce, still below peak - drawdown still open
            Case {
                input: Timed::new(95.0, time_plus_days(time_base, 4)),
                expected_state: DrawdownGenerator {
                    peak: 110.0,
                    drawdown_max: 0.2,
                    time_peak: time_plus_days(time_base, 1),
                    time_now: time_plus_days(time_base, 4),
                },
                expected_output: None,
            },
            // full recovery above the old peak closes the drawdown period
            Case {
                input: Timed::new(115.0, time_plus_days(time_base, 5)),
                expected_state: DrawdownGenerator {
                    peak: 115.0,
                    drawdown_max: 0.0,
                    time_peak: time_plus_days(time_base, 5),
                    time_now: time_plus_days(time_base, 5),
                },
                expected_output: Some(Drawdown {
                    value: 0.2,
                    time_start: time_plus_days(time_base, 1),
                    time_end: time_plus_days(time_base, 5),
                }),
            },
            // matching the peak exactly doesn't open a fresh period
            Case {
                input: Timed::new(115.0, time_plus_days(time_base, 6)),
                expected_state: DrawdownGenerator {
                    peak: 115.0,
                    drawdown_max: 0.0,
                    time_peak: time_plus_days(time_base, 5),
                    time_now: time_plus_days(time_base, 6),
                },
                expected_output: None,
            },
            // tiny sub-peak dip, exercises float precision
            Case {
                input: Timed::new(114.99999, time_plus_days(time_base, 7)),
                expected_state: DrawdownGenerator {
                    peak: 115.0,
                    drawdown_max: 8.695652176673163e-8, // (115-114.99999)/115
                    time_peak: time_plus_days(time_base, 5),
                    time_now: time_plus_days(time_base, 7),
                },
                expected_output: None,
            },
            // a big jump clear past the old peak, closing out the tiny drawdown
            Case {
                input: Timed::new(200.0, time_plus_days(time_base, 8)),
                expected_state: DrawdownGenerator {
                    peak: 200.0,
                    drawdown_max: 0.0,
                    time_peak: time_plus_days(time_base, 8),
                    time_now: time_plus_days(time_base, 8),
                },
                expected_output: Some(Drawdown {
                    value: 8.695652176673163e-8,
                    time_start: time_plus_days(time_base, 5),
                    time_end: time_plus_days(time_base, 8),
                }),
            },
        ];

        for (index, case) in cases.into_iter().enumerate() {
            let output = generator.update(case.input);
            assert_eq!(generator, case.expected_state, "TC{index} failed");
            assert_eq!(output, case.expected_output, "TC{index} failed");
        }
    }
}
