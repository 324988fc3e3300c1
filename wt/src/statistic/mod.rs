/// Statistical algorithms for analysing datasets.
pub mod algorithm;

/// Errors generated while building statistical summaries.
pub mod error;

/// Financial metrics and the means to calculate them over different
/// [`TimeIntervals`](time::TimeInterval).
pub mod metric;

/// Aggregates a context's trade/close logs and equity curve into the
/// win-rate, ratio, and drawdown summary written to `{name}.json`.
pub mod summary;

/// TimeInterval definitions used for financial calculations.
///
/// For example, `Annual365`, `Annual252`, `Daily`, etc.
pub mod time;
