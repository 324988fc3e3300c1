//! Assembles an [`Engine`] from a [`config::SystemConfig`] and drives it
//! to completion on the calling thread.
//!
//! [`Engine`]: crate::engine::Engine

use wt_instrument::exchange::{Code, Exchange};
use wt_store::record::TickRecord;

use crate::engine::clock::EngineClock;
use crate::engine::run::{run, ShutdownReason, Terminate};
use crate::engine::Engine;

/// Constructs a [`System`] from a [`config::SystemConfig`].
pub mod builder;

/// Serde configuration for an assembled [`System`].
pub mod config;

/// A fully-wired [`Engine`] plus the [`Terminate`] flag used to stop it
/// from another thread. Owning both together means a caller never has
/// to thread a `Terminate` through separately to get a running system
/// to stop.
#[derive(Debug)]
pub struct System<C: EngineClock> {
    engine: Engine<C>,
    terminate: Terminate,
}

impl<C: EngineClock> System<C> {
    pub fn new(engine: Engine<C>) -> Self {
        Self { engine, terminate: Terminate::new() }
    }

    pub fn engine(&self) -> &Engine<C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<C> {
        &mut self.engine
    }

    /// Signals [`run_to_completion`](Self::run_to_completion) to stop
    /// after its current tick finishes. Safe to call from another
    /// thread.
    pub fn stop(&self) {
        self.terminate.stop();
    }

    /// Drains `feed` into the engine until it's exhausted, [`stop`](Self::stop)
    /// is called, or an unrecoverable error is hit, then dumps every
    /// context's end-of-run state and user data to its output files.
    pub fn run_to_completion<Feed>(&mut self, feed: &mut Feed) -> ShutdownReason
    where
        Feed: Iterator<Item = (Exchange, Code, TickRecord)>,
    {
        let reason = run(&mut self.engine, feed, &self.terminate);
        self.engine.finalize();
        reason
    }
}
