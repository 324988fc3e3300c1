use thiserror::Error;
use wt_execution::error::ExecutionError;
use wt_instrument::error::BaseDataError;
use wt_store::error::StoreError;
use wt_strategy::StrategyError;

use crate::reader::ReaderError;

/// Top-level error for this crate, wrapping each sibling crate's error
/// type alongside the engine/reader/ticker-level failures that only
/// make sense once they're wired together.
#[derive(Debug, Error)]
pub enum WtError {
    #[error("base data: {0}")]
    BaseData(#[from] BaseDataError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("execution: {0}")]
    Execution(#[from] ExecutionError),

    #[error("strategy: {0}")]
    Strategy(#[from] StrategyError),

    #[error("reader: {0}")]
    Reader(#[from] ReaderError),

    #[error("context {0:?} is not registered with this engine")]
    UnknownContext(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WtError>;
