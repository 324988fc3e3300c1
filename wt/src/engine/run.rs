use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use wt_instrument::exchange::{Code, Exchange};
use wt_store::record::TickRecord;

use crate::engine::clock::EngineClock;
use crate::engine::Engine;

/// Why [`run`] stopped dispatching.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShutdownReason {
    /// The feed iterator ran out (end of replay, or the live parser
    /// thread closed its channel).
    FeedEnded,
    /// [`Terminate::stop`] was called from another thread: an explicit
    /// stop sets a shared flag, checked once per loop iteration; any
    /// in-flight work completes first.
    Stopped,
    /// An unrecoverable error was hit while dispatching a tick.
    Error,
}

/// Shared flag a caller can use to stop [`run`] from another thread.
#[derive(Debug, Clone, Default)]
pub struct Terminate(Arc<AtomicBool>);

impl Terminate {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drains `feed` into `engine.on_tick`, one tick at a time, on the
/// calling thread: ticks are dispatched sequentially and context
/// callbacks run synchronously. Stops on feed exhaustion, an explicit
/// [`Terminate::stop`], or the first error
/// [`Unrecoverable::is_unrecoverable`] reports true for.
pub fn run<C, Feed>(engine: &mut Engine<C>, feed: &mut Feed, terminate: &Terminate) -> ShutdownReason
where
    C: EngineClock,
    Feed: Iterator<Item = (Exchange, Code, TickRecord)>,
{
    use crate::engine::error::Unrecoverable;

    info!("engine run loop starting");

    let reason = loop {
        if terminate.is_stopped() {
            break ShutdownReason::Stopped;
        }

        let Some((exchange, code, tick)) = feed.next() else {
            break ShutdownReason::FeedEnded;
        };

        if let Err(err) = engine.on_tick(&exchange, &code, tick) {
            tracing::warn!(%err, "tick dispatch failed");
            if err.is_unrecoverable() {
                break ShutdownReason::Error;
            }
        }
    };

    info!(?reason, "engine run loop stopped");
    reason
}
