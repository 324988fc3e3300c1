use crate::model::{Comparator, CondOrder, ExitLevel, MultiLevelExit};

/// A fired conditional order: what to target and at what price it
/// effectively executes once clamped to the bar's range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub target_qty: i64,
    pub exec_price: f64,
}

/// One bar's price excursion as seen by the replayer/ticker: a plain
/// live tick has `prev_price == cur_price` and degenerates to a point
/// comparison against the current price. A replayed close pseudo-tick
/// (`px_type == 3`) also degenerates to a point at `cur_price` even
/// when `prev_price` differs: the bar it closes has already ended, so
/// matching must not reach for a fill anywhere inside its range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub prev_price: f64,
    pub cur_price: f64,
    pub bar_closed: bool,
}

impl PriceRange {
    pub fn tick(price: f64) -> Self {
        Self { prev_price: price, cur_price: price, bar_closed: false }
    }

    /// A range for one quote, given whether it's the bar-close pseudo-tick.
    pub fn quote(prev_price: f64, cur_price: f64, bar_closed: bool) -> Self {
        Self { prev_price, cur_price, bar_closed }
    }

    fn low(self) -> f64 {
        if self.bar_closed {
            self.cur_price
        } else {
            self.prev_price.min(self.cur_price)
        }
    }

    fn high(self) -> f64 {
        if self.bar_closed {
            self.cur_price
        } else {
            self.prev_price.max(self.cur_price)
        }
    }

    /// Whether `comparator` against `target` is satisfied anywhere in
    /// `[low, high]`, and if so the clamped execution price: buying-stops
    /// match at `max(left, target)`, selling-stops at `min(right, target)`.
    fn evaluate(self, comparator: Comparator, target: f64) -> Option<f64> {
        let (low, high) = (self.low(), self.high());
        match comparator {
            Comparator::Eq => (low..=high).contains(&target).then_some(target),
            Comparator::Ge | Comparator::Gt => (high >= target).then_some(low.max(target)),
            Comparator::Le | Comparator::Lt => (low <= target).then_some(high.min(target)),
        }
    }
}

/// Picks, among all conditional orders queued for one code, the single
/// winner for this bar:
/// - among `>=`/`>` matches, the smaller target wins;
/// - among `<=`/`<` matches, the larger target wins;
/// - across comparator families, first-inserted wins.
pub fn evaluate_conditionals(range: PriceRange, orders: &[CondOrder]) -> Option<(usize, Trigger)> {
    let mut best: Option<(usize, f64, Trigger)> = None;
    for (idx, order) in orders.iter().enumerate() {
        let Some(exec_price) = range.evaluate(order.comparator, order.target_price) else {
            continue;
        };
        let trigger = Trigger { target_qty: order.target_qty, exec_price };
        best = Some(match best {
            None => (idx, order.target_price, trigger),
            Some((best_idx, best_target, best_trigger)) => {
                let same_family = orders[best_idx].comparator.is_upward() == order.comparator.is_upward()
                    && orders[best_idx].comparator.is_downward() == order.comparator.is_downward();
                if same_family && order.comparator.is_upward() && order.target_price < best_target {
                    (idx, order.target_price, trigger)
                } else if same_family && order.comparator.is_downward() && order.target_price > best_target {
                    (idx, order.target_price, trigger)
                } else {
                    (best_idx, best_target, best_trigger)
                }
            }
        });
    }
    best.map(|(idx, _, trigger)| (idx, trigger))
}

/// Evaluates the next pending level of a multi-level exit ladder
/// against this bar's range; at most one level fires.
pub fn evaluate_multi_level(range: PriceRange, ladder: &mut MultiLevelExit) -> Option<ExitLevel> {
    let level = ladder.pending()?;
    let exec_price = range.evaluate(ladder.comparator, level.trigger_price)?;
    ladder.next_level += 1;
    Some(ExitLevel { trigger_price: exec_price, exit_fraction: level.exit_fraction })
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol_str::SmolStr;

    fn cond(comparator: Comparator, target: f64, qty: i64) -> CondOrder {
        CondOrder { target_qty: qty, target_price: target, comparator, user_tag: SmolStr::new("") }
    }

    #[test]
    fn real_tick_point_comparison_matches_ge() {
        let range = PriceRange::tick(3505.0);
        let orders = vec![cond(Comparator::Ge, 3500.0, 10)];
        let (idx, trigger) = evaluate_conditionals(range, &orders).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(trigger.exec_price, 3505.0);
    }

    #[test]
    fn simulated_range_clamps_buying_stop_to_target() {
        let range = PriceRange::quote(3490.0, 3510.0, false);
        let orders = vec![cond(Comparator::Ge, 3500.0, 10)];
        let (_, trigger) = evaluate_conditionals(range, &orders).unwrap();
        assert_eq!(trigger.exec_price, 3500.0);
    }

    #[test]
    fn simulated_range_clamps_selling_stop_to_target() {
        let range = PriceRange::quote(3510.0, 3490.0, false);
        let orders = vec![cond(Comparator::Le, 3500.0, -10)];
        let (_, trigger) = evaluate_conditionals(range, &orders).unwrap();
        assert_eq!(trigger.exec_price, 3500.0);
    }

    #[test]
    fn same_family_upward_orders_pick_the_smaller_target() {
        let range = PriceRange::quote(3490.0, 3520.0, false);
        let orders = vec![cond(Comparator::Ge, 3510.0, 1), cond(Comparator::Ge, 3500.0, 2)];
        let (idx, _) = evaluate_conditionals(range, &orders).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn same_family_downward_orders_pick_the_larger_target() {
        let range = PriceRange::quote(3520.0, 3480.0, false);
        let orders = vec![cond(Comparator::Le, 3490.0, 1), cond(Comparator::Le, 3500.0, 2)];
        let (idx, _) = evaluate_conditionals(range, &orders).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn mixed_families_first_inserted_wins() {
        let range = PriceRange::quote(3480.0, 3520.0, false);
        let orders = vec![cond(Comparator::Ge, 3500.0, 1), cond(Comparator::Le, 3500.0, 2)];
        let (idx, _) = evaluate_conditionals(range, &orders).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn bar_closed_quote_ignores_the_range_and_matches_only_the_close() {
        // The full range 3490..3510 would satisfy `>= 3505`, but the bar
        // already closed at 3500: no fill should be reported.
        let range = PriceRange::quote(3490.0, 3500.0, true);
        let orders = vec![cond(Comparator::Ge, 3505.0, 10)];
        assert!(evaluate_conditionals(range, &orders).is_none());

        let range = PriceRange::quote(3490.0, 3510.0, true);
        let orders = vec![cond(Comparator::Ge, 3500.0, 10)];
        let (_, trigger) = evaluate_conditionals(range, &orders).unwrap();
        assert_eq!(trigger.exec_price, 3510.0);
    }

    #[test]
    fn no_match_returns_none() {
        let range = PriceRange::tick(3000.0);
        let orders = vec![cond(Comparator::Ge, 3500.0, 10)];
        assert!(evaluate_conditionals(range, &orders).is_none());
    }

    #[test]
    fn multi_level_exit_fires_one_level_at_a_time() {
        let mut ladder = MultiLevelExit::new(
            Comparator::Ge,
            vec![
                ExitLevel { trigger_price: 3500.0, exit_fraction: 0.5 },
                ExitLevel { trigger_price: 3600.0, exit_fraction: 1.0 },
            ],
        );
        let range = PriceRange::tick(3550.0);
        let fired = evaluate_multi_level(range, &mut ladder).unwrap();
        assert_eq!(fired.exit_fraction, 0.5);
        assert_eq!(ladder.next_level, 1);
        assert!(evaluate_multi_level(range, &mut ladder).is_none());
    }
}
