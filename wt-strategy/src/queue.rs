use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::model::{CondOrder, FundInfo, MultiLevelExit, PosInfo, Signal};

/// Everything a strategy context tracks in memory: positions, one
/// pending signal per code, a conditional-order book, multi-level exit
/// ladders, and an opaque user-data KV store persisted at session end.
#[derive(Debug, Default)]
pub struct ContextState {
    pub fund: FundInfo,
    pub positions: IndexMap<SmolStr, PosInfo>,
    pub pending_signals: IndexMap<SmolStr, Signal>,
    pub conditional_orders: IndexMap<SmolStr, Vec<CondOrder>>,
    pub multi_level_exits: IndexMap<SmolStr, MultiLevelExit>,
    pub user_data: IndexMap<SmolStr, SmolStr>,
}

impl ContextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, code: &str) -> PosInfo {
        self.positions.get(code).cloned().unwrap_or_default()
    }

    pub fn position_mut(&mut self, code: &str) -> &mut PosInfo {
        self.positions.entry(SmolStr::new(code)).or_default()
    }

    pub fn queue_signal(&mut self, code: &str, signal: Signal) {
        self.pending_signals.insert(SmolStr::new(code), signal);
    }

    pub fn take_signal(&mut self, code: &str) -> Option<Signal> {
        self.pending_signals.shift_remove(code)
    }

    pub fn push_conditional(&mut self, code: &str, order: CondOrder) {
        self.conditional_orders.entry(SmolStr::new(code)).or_default().push(order);
    }

    /// Every conditional order queued against `code`. At most one
    /// conditional fires per code per bar, and the whole book for that
    /// code is cleared once it does.
    pub fn conditionals(&self, code: &str) -> &[CondOrder] {
        self.conditional_orders.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear_conditionals(&mut self, code: &str) {
        self.conditional_orders.shift_remove(code);
    }

    pub fn save_user_data(&mut self, key: &str, value: &str) {
        self.user_data.insert(SmolStr::new(key), SmolStr::new(value));
    }

    pub fn load_user_data<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.user_data.get(key).map(SmolStr::as_str).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SignalKind;

    #[test]
    fn queue_then_take_signal_round_trips() {
        let mut state = ContextState::new();
        state.queue_signal("rb2410", Signal { target_qty: 5, user_tag: "s1".into(), kind: SignalKind::Immediate });
        let signal = state.take_signal("rb2410").unwrap();
        assert_eq!(signal.target_qty, 5);
        assert!(state.take_signal("rb2410").is_none());
    }

    #[test]
    fn user_data_falls_back_to_default_when_missing() {
        let mut state = ContextState::new();
        assert_eq!(state.load_user_data("k", "dflt"), "dflt");
        state.save_user_data("k", "v");
        assert_eq!(state.load_user_data("k", "dflt"), "v");
    }

    #[test]
    fn clearing_conditionals_empties_the_code_bucket() {
        let mut state = ContextState::new();
        state.push_conditional(
            "rb2410",
            CondOrder {
                target_qty: 10,
                target_price: 3500.0,
                comparator: crate::model::Comparator::Ge,
                user_tag: "s1".into(),
            },
        );
        assert_eq!(state.conditionals("rb2410").len(), 1);
        state.clear_conditionals("rb2410");
        assert!(state.conditionals("rb2410").is_empty());
    }
}
