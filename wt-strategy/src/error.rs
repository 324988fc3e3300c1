use thiserror::Error;

/// Every rejected strategy-API call surfaces one of these; the caller
/// gets the error code, the log line carries the reason.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum StrategyError {
    #[error("no contract registered for {0}")]
    UnknownContract(String),

    #[error("cannot reduce position below frozen (T+1): current {current}, frozen {frozen}, target {target}")]
    BelowFrozen { current: i64, frozen: i64, target: i64 },

    #[error("contract does not permit short positions")]
    ShortNotAllowed,

    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, StrategyError>;
