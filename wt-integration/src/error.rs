use thiserror::Error;

/// Small shared error type for the handful of concerns genuinely common
/// across crates (JSON persistence of user-data / snapshots). Each crate
/// still defines its own domain error enum (`StoreError`,
/// `StrategyError`, `ExecutionError`, ...) — there is no unified
/// exception mechanism across components; this type is not a
/// catch-all, just the shared leaf.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json (de)serialisation error: {0}")]
    Json(#[from] serde_json::Error),
}
