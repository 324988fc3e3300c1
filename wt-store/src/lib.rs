#![warn(missing_debug_implementations, rust_2018_idioms)]

//! # wt-store
//!
//! The columnar market-data store (component C1): a per-(exchange, code,
//! stream) memory-mapped real-time ring block backed by an append-only
//! compressed historical archive, plus an optional LMDB-keyed variant for
//! random-access-by-time workloads.
//!
//! Layout mirrors the split the original engine makes between "today's
//! data, mutable and hot" (`rt`) and "every prior day, append-only and
//! cold" (`his`): see [`rt`] and [`his`]. [`record`] defines the fixed
//! binary layouts shared by both layers; [`bar_agg`] and [`dedup`]
//! implement the write-path rules a store must apply before a tick or bar
//! is durable.

pub mod bar_agg;
pub mod block;
pub mod config;
pub mod dedup;
pub mod error;
pub mod his;
pub mod lmdb;
pub mod marker;
pub mod record;
pub mod rt;
pub mod store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use record::{BarRecord, OrderDetailRecord, OrderQueueRecord, TickRecord, TransactionRecord};
pub use store::DataStore;
