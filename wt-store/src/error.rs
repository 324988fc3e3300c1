use smol_str::SmolStr;
use thiserror::Error;

/// All fallible store operations return `Result<T, StoreError>`. Every
/// variant is logged exactly once at `WARN` or above by the call site
/// that first observes it, tagged `[store][{exchange}.{code}]`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt block for {exchange}.{code} ({stream}): {reason}")]
    Corruption {
        exchange: SmolStr,
        code: SmolStr,
        stream: &'static str,
        reason: String,
    },

    #[error("no contract registered for {exchange}.{code}")]
    ContractNotFound { exchange: SmolStr, code: SmolStr },

    #[error("stale tick for {exchange}.{code}: {reason}")]
    StaleTick {
        exchange: SmolStr,
        code: SmolStr,
        reason: &'static str,
    },

    #[error("compression failure on {exchange}.{code}: {reason}")]
    Compression {
        exchange: SmolStr,
        code: SmolStr,
        reason: String,
    },

    #[error("lmdb error: {0}")]
    Lmdb(#[from] heed::Error),
}

impl StoreError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
