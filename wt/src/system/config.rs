use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use wt_instrument::{ContractInfo, SessionInfo};
use wt_store::config::StoreConfig;
use wt_strategy::StrategyConfig;

/// Top-level, serde-deserialized (TOML/JSON) configuration for a full
/// trading system: base data, storage, the context universe, and
/// whether to run against history or live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemConfig {
    pub base_data: BaseDataSeed,
    pub store: StoreConfig,
    pub contexts: Vec<ContextConfig>,
    #[serde(default)]
    pub risk_free_return: f64,
    pub run_mode: RunMode,
    /// Root directory for per-context trade/close/fund CSVs and the
    /// end-of-run state/user-data JSON dumps. `None` runs without
    /// output files at all (eg/ a pure in-memory test harness).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Seeds a [`wt_instrument::registry::BaseDataRegistry`] from config
/// rather than a database: the contract/session/holiday universe this
/// system knows about.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BaseDataSeed {
    pub contracts: Vec<ContractInfo>,
    pub sessions: Vec<SessionInfo>,
    #[serde(default)]
    pub holiday_templates: Vec<HolidayTemplateSeed>,
}

/// One named holiday calendar, as a flat list of `YYYYMMDD` dates
/// (`wt_instrument::holiday::HolidayTemplate` itself isn't
/// serde-derived, so the registry builds it from this on load).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HolidayTemplateSeed {
    pub name: String,
    pub holidays: Vec<u32>,
}

/// One strategy context's configuration plus which ticks/bars it
/// subscribes to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextConfig {
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub schedule_driven: bool,
    #[serde(default)]
    pub tick_subscriptions: Vec<SubscriptionKey>,
    #[serde(default)]
    pub bar_subscriptions: Vec<BarSubscriptionKey>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionKey {
    pub exchange: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BarSubscriptionKey {
    pub exchange: String,
    pub code: String,
    pub period_minutes: u32,
}

/// Whether the assembled system replays an archive over a fixed date
/// range or drives live ticks indefinitely.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub enum RunMode {
    Backtest { start: u32, end: u32 },
    Live,
}
