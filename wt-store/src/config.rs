use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which backing layers are active for a given deployment. The RT and
/// HIS layers are not mutually exclusive with the LMDB variant — any
/// combination may be enabled.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
pub struct EnabledLayers {
    #[serde(default = "default_true")]
    pub rt: bool,
    #[serde(default = "default_true")]
    pub his: bool,
    #[serde(default)]
    pub lmdb: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EnabledLayers {
    fn default() -> Self {
        Self {
            rt: true,
            his: true,
            lmdb: false,
        }
    }
}

/// Initial record capacities for the RT ring blocks, one field per
/// stream. `bar_1m`/`bar_5m` are overridden per-contract at open time by
/// `session.tradingMinutes`-derived values when `None`.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct StreamCapacities {
    #[serde(default = "default_tick_capacity")]
    pub tick: u32,
    #[serde(default = "default_tick_capacity")]
    pub order_detail: u32,
    #[serde(default = "default_tick_capacity")]
    pub order_queue: u32,
    #[serde(default = "default_tick_capacity")]
    pub transaction: u32,
    #[serde(default)]
    pub bar_1m: Option<u32>,
    #[serde(default)]
    pub bar_5m: Option<u32>,
}

fn default_tick_capacity() -> u32 {
    2500
}

impl Default for StreamCapacities {
    fn default() -> Self {
        Self {
            tick: default_tick_capacity(),
            order_detail: default_tick_capacity(),
            order_queue: default_tick_capacity(),
            transaction: default_tick_capacity(),
            bar_1m: None,
            bar_5m: None,
        }
    }
}

/// Top-level store configuration, serde-deserialized from the engine's
/// TOML/JSON config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Root directory; `rt/` and `his/` subtrees are created beneath it.
    pub base_dir: PathBuf,
    #[serde(default)]
    pub capacities: StreamCapacities,
    #[serde(default)]
    pub layers: EnabledLayers,
    /// Don't accumulate a tick into the running bar when it carries no
    /// turnover.
    #[serde(default)]
    pub skip_notrade_tick: bool,
    /// Don't even open/create a bar for a no-turnover tick.
    #[serde(default)]
    pub skip_notrade_bar: bool,
    /// RT/HIS writes happen off the engine thread via a FIFO-per-code
    /// task queue.
    #[serde(default)]
    pub async_proc: bool,
}

impl StoreConfig {
    pub fn rt_dir(&self) -> PathBuf {
        self.base_dir.join("rt")
    }

    pub fn his_dir(&self) -> PathBuf {
        self.base_dir.join("his")
    }

    pub fn lmdb_dir(&self) -> PathBuf {
        self.base_dir.join("lmdb")
    }

    pub fn marker_path(&self) -> PathBuf {
        self.base_dir.join("marker.ini")
    }
}
