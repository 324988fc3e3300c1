#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments, type_alias_bounds)]

//! # wt
//! `wt` is the engine crate of a quantitative trading framework for
//! Chinese futures and equities markets: it wires together base-data
//! registries, memory-mapped tick/bar storage, a session-aware bar
//! ticker, strategy contexts, and trader/parser adapters into a single
//! synchronous live-trading or backtesting process.
//!
//! ## Overview
//! At a high level this crate provides:
//! * [`engine::Engine`], which owns the base-data registry, the tick/bar
//!   store, and every running strategy context, and dispatches ticks,
//!   bar-closes, and schedule events to them in a single dispatching
//!   thread (no cooperative scheduler, no async I/O).
//! * [`ticker::SessionTicker`], which turns a forward-only stream of
//!   ticks into bar-close and session-begin/end events using a
//!   contract's trading-session schedule.
//! * [`reader`], which unifies live tick/bar reads and ordered
//!   historical replay behind one [`reader::DataReader`] trait.
//! * [`outputs`], which writes the CSV/JSON files a backtest or live
//!   session leaves behind per strategy context.
//! * [`system::System`], which assembles the above from a
//!   [`system::SystemConfig`] and runs it to completion or until
//!   stopped.
//! * [`statistic`], a trading-summary package (win rate, profit factor,
//!   Sharpe/Sortino/Calmar, drawdown) fed from a context's trade and
//!   equity history.

use chrono::{DateTime, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Owns the base-data registry, store, contexts, and session ticker,
/// and dispatches market data to strategy contexts.
pub mod engine;

/// Defines all possible errors surfaced by this crate.
pub mod error;

/// Default Tracing logging initialisers, formatting records as
/// `[component][id] message`.
pub mod logging;

/// Writers for the per-context CSV/JSON output files a session leaves
/// behind (`trades.csv`, `closes.csv`, `funds.csv`, `signals.csv`,
/// `positions.csv`, `indice.csv`, `marks.csv`, `{name}.json`).
pub mod outputs;

/// Unified live-read and historical-replay access to tick/bar archives.
pub mod reader;

/// Statistical algorithms for analysing datasets and financial metrics.
///
/// eg/ `TradingSummary`, `SharpeRatio`, `MaxDrawdown`, etc.
pub mod statistic;

/// Assembles an [`engine::Engine`] from a [`system::SystemConfig`] and
/// runs it to completion or until stopped.
pub mod system;

/// Turns a forward-only tick stream into bar-close and
/// session-begin/end events.
pub mod ticker;

/// A timed value.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Deserialize,
    Serialize,
    Constructor,
)]
pub struct Timed<T> {
    pub value: T,
    pub time: DateTime<Utc>,
}

/// Test utilities shared across this crate's unit tests.
pub mod test_utils {
    use chrono::{DateTime, Days, TimeDelta, Utc};

    pub fn f64_is_eq(actual: f64, expected: f64, epsilon: f64) -> bool {
        if actual.is_nan() && expected.is_nan() {
            true
        } else if actual.is_infinite() && expected.is_infinite() {
            actual.is_sign_positive() == expected.is_sign_positive()
        } else if actual.is_nan() || expected.is_nan() || actual.is_infinite() || expected.is_infinite() {
            false
        } else {
            (actual - expected).abs() < epsilon
        }
    }

    pub fn time_plus_days(base: DateTime<Utc>, plus: u64) -> DateTime<Utc> {
        base.checked_add_days(Days::new(plus)).unwrap()
    }

    pub fn time_plus_secs(base: DateTime<Utc>, plus: i64) -> DateTime<Utc> {
        base.checked_add_signed(TimeDelta::seconds(plus)).unwrap()
    }

    pub fn time_plus_millis(base: DateTime<Utc>, plus: i64) -> DateTime<Utc> {
        base.checked_add_signed(TimeDelta::milliseconds(plus)).unwrap()
    }

    pub fn time_plus_micros(base: DateTime<Utc>, plus: i64) -> DateTime<Utc> {
        base.checked_add_signed(TimeDelta::microseconds(plus)).unwrap()
    }
}
