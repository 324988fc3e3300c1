use thiserror::Error;
use wt_execution::error::ExecutionError;
use wt_store::error::StoreError;

/// Represents possible errors that can occur in the [`Engine`](super::Engine).
///
/// A distinction is made between a recoverable and unrecoverable error:
/// - Recoverable errors do not result in the termination of the `Engine`.
/// - Unrecoverable errors result in the graceful termination of the `Engine`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("recoverable error: {0}")]
    Recoverable(#[from] RecoverableEngineError),

    #[error("unrecoverable error: {0}")]
    Unrecoverable(#[from] UnrecoverableEngineError),
}

/// Temporary error conditions the [`Engine`](super::Engine) can recover
/// from without stopping its dispatch loop.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum RecoverableEngineError {
    #[error("tick for unregistered contract {exchange}.{code}")]
    UnknownContract { exchange: String, code: String },

    #[error("context {0:?} is not registered with this engine")]
    UnknownContext(String),

    #[error("order rejected: {0}")]
    OrderRejected(String),
}

/// Fatal error conditions the [`Engine`](super::Engine) cannot recover
/// from; the dispatch loop must stop.
#[derive(Debug, Error)]
pub enum UnrecoverableEngineError {
    #[error("tick/bar store failure: {0}")]
    Store(#[from] StoreError),

    #[error("trader adapter failure: {0}")]
    Execution(#[from] ExecutionError),

    #[error("session ticker is not configured for contract {0}")]
    NoSession(String),

    #[error("{0}")]
    Custom(String),
}

/// Marks an error as unrecoverable, so callers can decide whether to
/// keep dispatching or shut the engine down.
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}

impl Unrecoverable for EngineError {
    fn is_unrecoverable(&self) -> bool {
        matches!(self, EngineError::Unrecoverable(_))
    }
}
