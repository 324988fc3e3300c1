use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::action_policy::ActionPolicyRule;

/// A sliding-window pre-send limiter's parameters: at most `boundary`
/// events per `timespan_secs`, and an optional lifetime `total_limits`
/// cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitWindow {
    pub timespan_secs: u64,
    pub boundary: u32,
    pub total_limits: Option<u32>,
}

impl Default for RateLimitWindow {
    fn default() -> Self {
        Self {
            timespan_secs: 1,
            boundary: 10,
            total_limits: None,
        }
    }
}

/// Top-level trader-adapter configuration, serde-deserialized from the
/// engine's TOML/JSON config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub order_limits: RateLimitWindow,
    #[serde(default)]
    pub cancel_limits: RateLimitWindow,
    #[serde(default)]
    pub action_policy: Vec<ActionPolicyRule>,
    pub entrust_cache_path: PathBuf,
}
