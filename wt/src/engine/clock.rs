use chrono::{DateTime, Utc};
use std::ops::Add;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Defines how the [`Engine`](super::Engine) determines the current
/// time: [`LiveClock`] for live trading, [`HistoricalClock`] for
/// replaying an archive.
pub trait EngineClock {
    fn time(&self) -> DateTime<Utc>;
}

/// Live clock using `Utc::now()`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct LiveClock;

impl EngineClock for LiveClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Lets [`Engine`](super::Engine) be built without knowing at compile
/// time whether it will run against a [`LiveClock`] or a
/// [`HistoricalClock`] — `system::SystemBuilder` picks one at runtime
/// based on `RunMode` and boxes it.
impl EngineClock for Box<dyn EngineClock + Send + Sync> {
    fn time(&self) -> DateTime<Utc> {
        (**self).time()
    }
}

/// Historical clock: tracks the action-time of the most recent tick
/// fed to it, and extrapolates forward using elapsed wall-clock time
/// between updates so that `time()` keeps advancing between ticks
/// rather than jumping only when a new tick arrives.
#[derive(Debug, Clone)]
pub struct HistoricalClock {
    inner: Arc<parking_lot::RwLock<HistoricalClockInner>>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct HistoricalClockInner {
    time_exchange_last: DateTime<Utc>,
    time_live_last_event: DateTime<Utc>,
}

impl HistoricalClock {
    /// Constructs a new `HistoricalClock` seeded with the first tick's
    /// action-time.
    pub fn new(last_exchange_time: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(parking_lot::RwLock::new(HistoricalClockInner {
                time_exchange_last: last_exchange_time,
                time_live_last_event: Utc::now(),
            })),
        }
    }

    /// Advances the clock's anchor to `time_exchange`, rejecting (and
    /// logging) any update older than the current anchor — ticks for a
    /// single code must arrive in action-time order.
    pub fn advance(&self, time_exchange: DateTime<Utc>) {
        let mut lock = self.inner.write();

        if time_exchange >= lock.time_exchange_last {
            lock.time_exchange_last = time_exchange;
            lock.time_live_last_event = Utc::now();
            return;
        }

        let time_diff_secs = time_exchange.signed_duration_since(lock.time_exchange_last).num_seconds().abs();
        if time_diff_secs < 1 {
            debug!(?time_exchange, time_exchange_last = ?lock.time_exchange_last, "historical clock received an out-of-order tick");
        } else if time_diff_secs < 30 {
            warn!(?time_exchange, time_exchange_last = ?lock.time_exchange_last, "historical clock received an out-of-order tick");
        } else {
            error!(?time_exchange, time_exchange_last = ?lock.time_exchange_last, "historical clock received an out-of-order tick");
        }
    }
}

impl EngineClock for HistoricalClock {
    fn time(&self) -> DateTime<Utc> {
        let lock = self.inner.read();
        let time_live_last_event = lock.time_live_last_event;
        let time_exchange_last = lock.time_exchange_last;
        drop(lock);

        let delta_since_last_event_live_time = Utc::now().signed_duration_since(time_live_last_event);

        match delta_since_last_event_live_time {
            delta if delta.num_milliseconds() >= 0 => time_exchange_last.add(delta),
            _ => time_exchange_last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn advance_moves_the_anchor_forward() {
        let base = DateTime::<Utc>::MIN_UTC;
        let clock = HistoricalClock::new(base);
        clock.advance(base + TimeDelta::seconds(5));
        assert_eq!(clock.inner.read().time_exchange_last, base + TimeDelta::seconds(5));
    }

    #[test]
    fn advance_ignores_an_out_of_order_tick() {
        let base = DateTime::<Utc>::MIN_UTC;
        let clock = HistoricalClock::new(base + TimeDelta::seconds(10));
        clock.advance(base);
        assert_eq!(clock.inner.read().time_exchange_last, base + TimeDelta::seconds(10));
    }

    #[test]
    fn historical_clock_time_advances_with_wall_clock() {
        let clock = HistoricalClock::new(DateTime::<Utc>::MIN_UTC);
        let time_1 = clock.time();
        spin_sleep::sleep(std::time::Duration::from_millis(50));
        let time_2 = clock.time();
        assert!(time_2 > time_1);
    }
}
