use chrono::{DateTime, Duration, Utc};
use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::VecDeque;

use crate::config::RateLimitWindow;
use crate::error::ExecutionError;

/// One sliding window of recent event timestamps plus a lifetime total.
/// `now` is passed in by the caller rather than read from the system
/// clock, so the same limiter works identically against replay's
/// simulated clock and live's wall clock.
struct Window {
    events: VecDeque<DateTime<Utc>>,
    total: u32,
}

impl Window {
    fn new() -> Self {
        Self { events: VecDeque::new(), total: 0 }
    }

    fn record_if_allowed(&mut self, now: DateTime<Utc>, cfg: &RateLimitWindow) -> bool {
        if let Some(limit) = cfg.total_limits {
            if self.total >= limit {
                return false;
            }
        }
        let cutoff = now - Duration::seconds(cfg.timespan_secs as i64);
        while self.events.front().is_some_and(|t| *t < cutoff) {
            self.events.pop_front();
        }
        if self.events.len() as u32 >= cfg.boundary {
            return false;
        }
        self.events.push_back(now);
        self.total += 1;
        true
    }
}

/// Pre-send rate limiting for order inserts and cancels, per code: a
/// code that exceeds its window is pushed into `excluded_codes` and
/// every further order on it is rejected until explicitly reset.
#[derive(Debug)]
pub struct RateLimiter {
    order_cfg: RateLimitWindow,
    cancel_cfg: RateLimitWindow,
    order_windows: Mutex<IndexMap<SmolStr, WindowHandle>>,
    cancel_windows: Mutex<IndexMap<SmolStr, WindowHandle>>,
    excluded_codes: Mutex<IndexSet<SmolStr>>,
}

struct WindowHandle(Window);

impl std::fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowHandle").finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(order_cfg: RateLimitWindow, cancel_cfg: RateLimitWindow) -> Self {
        Self {
            order_cfg,
            cancel_cfg,
            order_windows: Mutex::new(IndexMap::new()),
            cancel_windows: Mutex::new(IndexMap::new()),
            excluded_codes: Mutex::new(IndexSet::new()),
        }
    }

    pub fn is_excluded(&self, code: &str) -> bool {
        self.excluded_codes.lock().contains(code)
    }

    pub fn check_order_limits(&self, code: &str, now: DateTime<Utc>) -> Result<(), ExecutionError> {
        self.check(code, now, &self.order_windows, self.order_cfg)
    }

    pub fn check_cancel_limits(&self, code: &str, now: DateTime<Utc>) -> Result<(), ExecutionError> {
        self.check(code, now, &self.cancel_windows, self.cancel_cfg)
    }

    fn check(
        &self,
        code: &str,
        now: DateTime<Utc>,
        windows: &Mutex<IndexMap<SmolStr, WindowHandle>>,
        cfg: RateLimitWindow,
    ) -> Result<(), ExecutionError> {
        if self.is_excluded(code) {
            return Err(ExecutionError::RateLimited {
                exchange: SmolStr::default(),
                code: SmolStr::new(code),
            });
        }
        let mut guard = windows.lock();
        let window = guard.entry(SmolStr::new(code)).or_insert_with(|| WindowHandle(Window::new()));
        if window.0.record_if_allowed(now, &cfg) {
            Ok(())
        } else {
            drop(guard);
            self.excluded_codes.lock().insert(SmolStr::new(code));
            Err(ExecutionError::RateLimited { exchange: SmolStr::default(), code: SmolStr::new(code) })
        }
    }

    /// Clears a code's exclusion, eg/ after an operator investigates and
    /// confirms the burst was legitimate.
    pub fn reset(&self, code: &str) {
        self.excluded_codes.lock().shift_remove(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(boundary: u32) -> RateLimitWindow {
        RateLimitWindow { timespan_secs: 1, boundary, total_limits: None }
    }

    #[test]
    fn allows_up_to_the_boundary_within_the_window() {
        let limiter = RateLimiter::new(cfg(2), cfg(2));
        let now = Utc::now();
        assert!(limiter.check_order_limits("rb2410", now).is_ok());
        assert!(limiter.check_order_limits("rb2410", now).is_ok());
        assert!(limiter.check_order_limits("rb2410", now).is_err());
        assert!(limiter.is_excluded("rb2410"));
    }

    #[test]
    fn window_slides_past_the_timespan() {
        let limiter = RateLimiter::new(cfg(1), cfg(1));
        let t0 = Utc::now();
        assert!(limiter.check_order_limits("rb2410", t0).is_ok());
        assert!(limiter.check_order_limits("rb2410", t0).is_err());

        let t1 = t0 + Duration::seconds(2);
        // Excluded codes require an explicit reset even once the window
        // would otherwise allow traffic again.
        limiter.reset("rb2410");
        assert!(limiter.check_order_limits("rb2410", t1).is_ok());
    }

    #[test]
    fn total_limits_caps_lifetime_count_even_with_a_wide_window() {
        let limiter = RateLimiter::new(
            RateLimitWindow { timespan_secs: 60, boundary: 100, total_limits: Some(1) },
            cfg(100),
        );
        let now = Utc::now();
        assert!(limiter.check_order_limits("rb2410", now).is_ok());
        assert!(limiter.check_order_limits("rb2410", now + Duration::seconds(70)).is_err());
    }

    #[test]
    fn order_and_cancel_limits_are_independent() {
        let limiter = RateLimiter::new(cfg(1), cfg(1));
        let now = Utc::now();
        assert!(limiter.check_order_limits("rb2410", now).is_ok());
        assert!(limiter.check_cancel_limits("rb2410", now).is_ok());
    }
}
