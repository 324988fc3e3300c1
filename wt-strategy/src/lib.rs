pub mod action;
pub mod config;
pub mod error;
pub mod execution;
pub mod judgment;
pub mod model;
pub mod processor;
pub mod queue;
pub mod signal;
pub mod uft;

pub use action::{enter_long, enter_short, exit_long, exit_short, get_position};
pub use config::{FeeSchedule, PersistenceMode, SlippageMode, StrategyConfig};
pub use error::{Result, StrategyError};
pub use execution::{do_set_position, CloseLog, TradeLog};
pub use judgment::{evaluate_conditionals, evaluate_multi_level, PriceRange, Trigger};
pub use model::{Comparator, CondOrder, ExitLevel, FundInfo, MultiLevelExit, PosInfo, PositionDetail, Signal, SignalKind};
pub use processor::{on_bar, on_schedule, on_tick, ScheduleDriven, StrategyContext, TickDriven, TickOutcome};
pub use queue::ContextState;
pub use signal::set_position;
pub use uft::UftStore;
