use indexmap::IndexMap;
use parking_lot::Mutex;
use smol_str::SmolStr;

use crate::order::Direction;

/// Tracks per-code signed "undone" quantity: the net volume still in
/// flight toward the broker and not yet confirmed filled or canceled.
/// Positive means net-buying pressure outstanding, negative
/// net-selling. Strategies read this to avoid re-submitting into an
/// order that's already working.
#[derive(Debug, Default)]
pub struct UndoneTracker {
    by_code: Mutex<IndexMap<SmolStr, i64>>,
}

impl UndoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once, when a fresh order is accepted for emission.
    pub fn on_order_placed(&self, code: &str, direction: Direction, qty: i64) {
        let delta = if direction.is_long() { qty } else { -qty };
        *self.by_code.lock().entry(SmolStr::new(code)).or_insert(0) += delta;
    }

    /// Call on every fill and on a confirmed cancel of `left_qty` or on
    /// full cancel of the remaining quantity — either way the qty
    /// passed here is no longer outstanding.
    pub fn on_order_settled(&self, code: &str, direction: Direction, qty: i64) {
        let delta = if direction.is_long() { qty } else { -qty };
        if let Some(entry) = self.by_code.lock().get_mut(code) {
            *entry -= delta;
        }
    }

    pub fn undone_qty(&self, code: &str) -> i64 {
        self.by_code.lock().get(code).copied().unwrap_or(0)
    }

    /// Drops all tracked quantity for a code, eg/ once a post-reconnect
    /// order query has fully reconciled it.
    pub fn clear(&self, code: &str) {
        self.by_code.lock().shift_remove(code);
    }
}
