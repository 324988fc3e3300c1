use smol_str::SmolStr;

use crate::config::StrategyConfig;
use crate::error::Result;
use crate::execution::{do_set_position, CloseLog, TradeLog};
use crate::judgment::{evaluate_conditionals, evaluate_multi_level, PriceRange};
use crate::queue::ContextState;

/// Capability a context type advertises to the engine: tick-driven
/// contexts (CTA/UFT) run the full [`on_tick`] pipeline on every quote;
/// schedule-driven contexts (SEL) only ever run [`on_schedule`] and
/// never see [`on_tick`] at all.
pub trait StrategyContext {
    const SCHEDULE_DRIVEN: bool = false;
}

/// Marker type for CTA/UFT contexts: every quote drives [`on_tick`].
pub struct TickDriven;
impl StrategyContext for TickDriven {}

/// Marker type for SEL contexts: positions move only from
/// [`on_schedule`], never from intrabar price movement.
pub struct ScheduleDriven;
impl StrategyContext for ScheduleDriven {
    const SCHEDULE_DRIVEN: bool = true;
}

/// The net effect of one quote on one code: the logs produced by
/// applying a pending signal or a fired conditional order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickOutcome {
    pub trades: Vec<TradeLog>,
    pub closes: Vec<CloseLog>,
}

impl TickOutcome {
    fn extend(&mut self, trades: Vec<TradeLog>, closes: Vec<CloseLog>) {
        self.trades.extend(trades);
        self.closes.extend(closes);
    }
}

/// Applies a code's pending `set_position` signal, if any, at `price`.
/// Shared by every driver ([`on_tick`], [`on_bar`], [`on_schedule`]):
/// a signal queued by a strategy callback is always executed this way,
/// regardless of what advanced the context to this point.
#[allow(clippy::too_many_arguments)]
fn apply_pending_signal(
    state: &mut ContextState,
    config: &StrategyConfig,
    code: &str,
    price: f64,
    price_tick: f64,
    vol_scale: f64,
    t_plus_1: bool,
    enter_time: u32,
) -> Result<TickOutcome> {
    let mut outcome = TickOutcome::default();
    if let Some(signal) = state.take_signal(code) {
        let (trades, closes) = do_set_position(
            state, config, code, signal.target_qty, price, &signal.user_tag, price_tick, vol_scale, t_plus_1,
            enter_time,
        )?;
        outcome.extend(trades, closes);
    }
    Ok(outcome)
}

/// Runs the three-step per-quote sequence:
/// 1. apply the code's pending signal, if any, at the current price;
/// 2. mark every open lot's `dyn_profit`/max-excursion to the new price;
/// 3. evaluate conditional orders and the exit ladder, each good for at
///    most one fire per quote, executing at the clamped trigger price.
///
/// `bar_closed` is true for the replayed close pseudo-tick of a
/// bar-synthesized feed: the excursion between `prev_price` and `price`
/// already happened inside a bar that's now over, so conditional/ladder
/// matching degenerates to a point comparison against `price` instead of
/// clamping into that range.
///
/// Not called at all for [`ScheduleDriven`] contexts — those advance
/// purely through [`on_schedule`].
#[allow(clippy::too_many_arguments)]
pub fn on_tick(
    state: &mut ContextState,
    config: &StrategyConfig,
    code: &str,
    prev_price: f64,
    price: f64,
    bar_closed: bool,
    price_tick: f64,
    vol_scale: f64,
    t_plus_1: bool,
    enter_time: u32,
) -> Result<TickOutcome> {
    let mut outcome = apply_pending_signal(state, config, code, price, price_tick, vol_scale, t_plus_1, enter_time)?;

    for detail in &mut state.position_mut(code).details {
        detail.mark(price, vol_scale);
    }

    let range = PriceRange::quote(prev_price, price, bar_closed);

    let conditionals = state.conditionals(code).to_vec();
    if let Some((idx, trigger)) = evaluate_conditionals(range, &conditionals) {
        let user_tag = conditionals[idx].user_tag.clone();
        let (trades, closes) = do_set_position(
            state, config, code, trigger.target_qty, trigger.exec_price, &user_tag, price_tick, vol_scale, t_plus_1,
            enter_time,
        )?;
        outcome.extend(trades, closes);
        state.clear_conditionals(code);
    }

    if let Some(mut ladder) = state.multi_level_exits.shift_remove(code) {
        let current = state.position(code).volume();
        if let Some(level) = evaluate_multi_level(range, &mut ladder) {
            let reduce_by = (current.abs() as f64 * level.exit_fraction).round() as i64;
            let target = current - current.signum() * reduce_by;
            let (trades, closes) =
                do_set_position(state, config, code, target, level.trigger_price, "", price_tick, vol_scale, t_plus_1, enter_time)?;
            outcome.extend(trades, closes);
        }
        if !ladder.is_exhausted() {
            state.multi_level_exits.insert(SmolStr::new(code), ladder);
        }
    }

    Ok(outcome)
}

/// Runs a bar-subscribed context's once-per-bar-close update: applies
/// the code's pending signal at the bar's close price. Conditional
/// orders and the exit ladder are [`on_tick`]'s concern; a bar
/// subscriber sees one quote per bar and has no intrabar range to
/// clamp into.
#[allow(clippy::too_many_arguments)]
pub fn on_bar(
    state: &mut ContextState,
    config: &StrategyConfig,
    code: &str,
    close_price: f64,
    price_tick: f64,
    vol_scale: f64,
    t_plus_1: bool,
    enter_time: u32,
) -> Result<TickOutcome> {
    let outcome = apply_pending_signal(state, config, code, close_price, price_tick, vol_scale, t_plus_1, enter_time)?;
    for detail in &mut state.position_mut(code).details {
        detail.mark(close_price, vol_scale);
    }
    Ok(outcome)
}

/// Runs a schedule-driven context's periodic rebalance: unlike
/// [`on_tick`], this ignores conditional orders and the exit ladder
/// entirely — SEL strategies act only on their own clock, at `price`.
#[allow(clippy::too_many_arguments)]
pub fn on_schedule(
    state: &mut ContextState,
    config: &StrategyConfig,
    code: &str,
    price: f64,
    price_tick: f64,
    vol_scale: f64,
    t_plus_1: bool,
    enter_time: u32,
) -> Result<TickOutcome> {
    apply_pending_signal(state, config, code, price, price_tick, vol_scale, t_plus_1, enter_time)
}
