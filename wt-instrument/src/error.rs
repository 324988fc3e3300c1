use smol_str::SmolStr;
use thiserror::Error;

/// Errors surfaced by [`crate::registry::BaseDataRegistry`] lookups.
///
/// `ContractNotFound`-style lookups never panic: callers get an `Err`
/// (or, at the strategy-API boundary, a sentinel value) and a single
/// `WARN`-or-above log line tagged `[instrument][...]`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BaseDataError {
    #[error("unknown exchange: {0}")]
    UnknownExchange(SmolStr),

    #[error("unknown contract: {exchange}.{code}")]
    UnknownContract { exchange: SmolStr, code: SmolStr },

    #[error("unknown session: {0}")]
    UnknownSession(SmolStr),

    #[error("unknown holiday template: {0}")]
    UnknownHolidayTemplate(SmolStr),

    #[error("invalid HHMM time of day: {0}")]
    InvalidTimeOfDay(u32),

    #[error("invalid YYYYMMDD date: {0}")]
    InvalidDate(u32),
}
