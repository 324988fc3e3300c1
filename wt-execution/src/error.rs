use smol_str::SmolStr;
use thiserror::Error;

/// All fallible trader-adapter operations return `Result<T, ExecutionError>`,
/// each variant logged exactly once at `WARN` or above with a
/// `[execution][{exchange}.{code}]` prefix by the call site that first
/// observes it.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ExecutionError {
    #[error("broker login rejected: {0}")]
    LoginFailed(String),

    #[error("not connected to the broker")]
    NotConnected,

    #[error("order insert rejected: {0}")]
    InsertRejected(String),

    #[error("order cancel rejected: {0}")]
    CancelRejected(String),

    #[error("rate limit exceeded for {exchange}.{code}")]
    RateLimited { exchange: SmolStr, code: SmolStr },

    #[error("no contract registered for {exchange}.{code}")]
    ContractNotFound { exchange: SmolStr, code: SmolStr },

    #[error("unknown local order id {0}")]
    UnknownLocalOrder(u32),

    #[error("unknown broker order id {0}")]
    UnknownBrokerOrder(SmolStr),
}
