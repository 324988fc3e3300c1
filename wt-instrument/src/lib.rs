#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

//! # wt-instrument
//!
//! Core data describing what is traded and when: [`Exchange`] and
//! [`ContractInfo`], the [`SessionInfo`] trading-schedule algebra, a
//! [`holiday::HolidayCalendar`], and the [`registry::BaseDataRegistry`]
//! that ties them together and answers `calcTradingDate`-style
//! trading-date-arithmetic questions.
//!
//! None of this mutates after construction: contract/session data is
//! immutable for the process lifetime.

pub mod contract;
pub mod error;
pub mod exchange;
pub mod holiday;
pub mod registry;
pub mod session;

pub use contract::{ContractInfo, CoverMode};
pub use error::BaseDataError;
pub use exchange::Exchange;
pub use holiday::{HolidayCalendar, HolidayTemplate};
pub use registry::BaseDataRegistry;
pub use session::{SessionInfo, SessionSection};

/// A wall-clock time of day encoded as `HHMM` (eg/ 21:00 -> 2100, 00:30 -> 30).
pub type HhMm = u32;

/// A calendar or trading date encoded as `YYYYMMDD`.
pub type YmdDate = u32;
