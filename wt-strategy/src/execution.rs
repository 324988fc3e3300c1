use smol_str::SmolStr;
use wt_execution::order::Direction;

use crate::config::StrategyConfig;
use crate::error::{Result, StrategyError};
use crate::model::PositionDetail;
use crate::queue::ContextState;

/// One opening lot booked by [`do_set_position`], destined for a
/// context's `trades.csv` output.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeLog {
    pub code: SmolStr,
    pub direction: Direction,
    pub price: f64,
    pub volume: i64,
    pub fee: f64,
    pub user_tag: SmolStr,
    pub enter_time: u32,
}

/// One FIFO-matched close against an existing lot, destined for a
/// context's `closes.csv` output.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseLog {
    pub code: SmolStr,
    pub direction: Direction,
    pub open_price: f64,
    pub close_price: f64,
    pub volume: i64,
    pub profit: f64,
    pub fee: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    pub open_time: u32,
    pub close_time: u32,
    pub enter_tag: SmolStr,
    pub exit_tag: SmolStr,
    /// Running `total_closed_profit - total_fees` immediately after this
    /// close, as of the moment it was booked.
    pub total_profit: f64,
}

fn profit_sign(direction: Direction) -> f64 {
    if direction.is_long() { 1.0 } else { -1.0 }
}

/// Reconciles a context's position for `code` to `target_qty` at
/// `price`. Returns the trade/close log rows the caller should append
/// to the session's output files.
#[allow(clippy::too_many_arguments)]
pub fn do_set_position(
    state: &mut ContextState,
    config: &StrategyConfig,
    code: &str,
    target_qty: i64,
    price: f64,
    user_tag: &str,
    price_tick: f64,
    vol_scale: f64,
    t_plus_1: bool,
    enter_time: u32,
) -> Result<(Vec<TradeLog>, Vec<CloseLog>)> {
    // Borrowed as a disjoint field from `state.fund` below, not through a
    // `&mut self` method, so both can be live across the whole function.
    let pos = state.positions.entry(SmolStr::new(code)).or_default();
    let current_qty = pos.volume();

    if current_qty == target_qty {
        return Ok((Vec::new(), Vec::new()));
    }

    if target_qty < pos.frozen {
        return Err(StrategyError::BelowFrozen { current: current_qty, frozen: pos.frozen, target: target_qty });
    }

    let diff = target_qty - current_qty;
    let sign = if diff > 0 { 1.0 } else { -1.0 };
    let trade_price = config.slippage.apply(price, price_tick, sign);

    let opens_fresh_direction = current_qty == 0 || diff.signum() == current_qty.signum();

    if opens_fresh_direction {
        let direction = if diff > 0 { Direction::Long } else { Direction::Short };
        let volume = diff.abs();
        let fee = config.fees.open_fee(trade_price * volume as f64 * vol_scale);
        state.fund.total_fees += fee;
        pos.details.push(PositionDetail::new(direction, trade_price, volume, user_tag, enter_time));
        if diff > 0 {
            pos.frozen += if t_plus_1 { diff } else { 0 };
        }
        let trade = TradeLog {
            code: SmolStr::new(code),
            direction,
            price: trade_price,
            volume,
            fee,
            user_tag: SmolStr::new(user_tag),
            enter_time,
        };
        return Ok((vec![trade], Vec::new()));
    }

    let closing_direction = if current_qty > 0 { Direction::Long } else { Direction::Short };
    let mut remaining = diff.abs();
    let mut closes = Vec::new();

    while remaining > 0 && pos.valid_idx < pos.details.len() {
        let detail = &mut pos.details[pos.valid_idx];
        if detail.direction != closing_direction || detail.volume == 0 {
            pos.valid_idx += 1;
            continue;
        }
        let matched = remaining.min(detail.volume);
        let profit = (trade_price - detail.open_price) * matched as f64 * vol_scale * profit_sign(detail.direction);
        // Close-today's reduced rate needs the opened-vs-current trading day,
        // which this matcher doesn't track; the engine applies that split
        // when it re-prices the logged fee against its own calendar.
        let fee = config.fees.close_fee(trade_price * matched as f64 * vol_scale, false);

        state.fund.total_closed_profit += profit;
        state.fund.total_profit += profit - fee;
        state.fund.total_fees += fee;
        detail.closed_profit += profit;

        let prior_volume = detail.volume;
        detail.volume -= matched;
        detail.closed_volume += matched;
        detail.dyn_profit *= detail.volume as f64 / prior_volume as f64;

        closes.push(CloseLog {
            code: SmolStr::new(code),
            direction: detail.direction,
            open_price: detail.open_price,
            close_price: trade_price,
            volume: matched,
            profit,
            fee,
            max_profit: detail.max_profit,
            max_loss: detail.max_loss,
            open_time: detail.last_enter_time,
            close_time: enter_time,
            enter_tag: detail.open_tag.clone(),
            exit_tag: SmolStr::new(user_tag),
            total_profit: state.fund.total_closed_profit - state.fund.total_fees,
        });

        remaining -= matched;
        if detail.volume == 0 {
            pos.valid_idx += 1;
        }
    }

    pos.frozen = pos.frozen.min(pos.volume().max(0));

    let mut trades = Vec::new();
    if remaining > 0 {
        let direction = if diff > 0 { Direction::Long } else { Direction::Short };
        let fee = config.fees.open_fee(trade_price * remaining as f64 * vol_scale);
        state.fund.total_fees += fee;
        pos.details.push(PositionDetail::new(direction, trade_price, remaining, user_tag, enter_time));
        if diff > 0 {
            pos.frozen += if t_plus_1 { remaining } else { 0 };
        }
        trades.push(TradeLog {
            code: SmolStr::new(code),
            direction,
            price: trade_price,
            volume: remaining,
            fee,
            user_tag: SmolStr::new(user_tag),
            enter_time,
        });
    }

    Ok((trades, closes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyConfig;

    fn cfg() -> StrategyConfig {
        StrategyConfig { context_id: "t".to_string(), ..Default::default() }
    }

    #[test]
    fn opening_from_flat_books_a_single_trade() {
        let mut state = ContextState::new();
        let (trades, closes) = do_set_position(&mut state, &cfg(), "rb2410", 10, 3500.0, "s1", 1.0, 1.0, false, 0).unwrap();
        assert_eq!(trades.len(), 1);
        assert!(closes.is_empty());
        assert_eq!(state.position("rb2410").volume(), 10);
    }

    #[test]
    fn stacking_in_the_same_direction_appends_a_detail() {
        let mut state = ContextState::new();
        do_set_position(&mut state, &cfg(), "rb2410", 10, 3500.0, "s1", 1.0, 1.0, false, 0).unwrap();
        do_set_position(&mut state, &cfg(), "rb2410", 15, 3510.0, "s1", 1.0, 1.0, false, 0).unwrap();
        assert_eq!(state.position("rb2410").volume(), 15);
        assert_eq!(state.position("rb2410").details.len(), 2);
    }

    #[test]
    fn reducing_books_a_close_log_with_profit() {
        let mut state = ContextState::new();
        do_set_position(&mut state, &cfg(), "rb2410", 10, 3500.0, "s1", 1.0, 1.0, false, 0).unwrap();
        let (trades, closes) = do_set_position(&mut state, &cfg(), "rb2410", 4, 3520.0, "s1", 1.0, 1.0, false, 0).unwrap();
        assert!(trades.is_empty());
        assert_eq!(closes.len(), 1);
        assert_eq!(closes[0].volume, 6);
        assert_eq!(closes[0].profit, 120.0);
        assert_eq!(state.position("rb2410").volume(), 4);
        assert_eq!(state.fund.total_closed_profit, 120.0);
    }

    #[test]
    fn flipping_closes_the_old_side_and_opens_the_new_one() {
        let mut state = ContextState::new();
        do_set_position(&mut state, &cfg(), "rb2410", 10, 3500.0, "s1", 1.0, 1.0, false, 0).unwrap();
        let (trades, closes) = do_set_position(&mut state, &cfg(), "rb2410", -5, 3480.0, "s1", 1.0, 1.0, false, 0).unwrap();
        assert_eq!(closes.len(), 1);
        assert_eq!(closes[0].volume, 10);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].volume, 5);
        assert_eq!(trades[0].direction, Direction::Short);
        assert_eq!(state.position("rb2410").volume(), -5);
    }

    #[test]
    fn reducing_below_frozen_is_rejected() {
        let mut state = ContextState::new();
        do_set_position(&mut state, &cfg(), "rb2410", 10, 3500.0, "s1", 1.0, 1.0, true, 0).unwrap();
        let err = do_set_position(&mut state, &cfg(), "rb2410", 2, 3500.0, "s1", 1.0, 1.0, true, 0).unwrap_err();
        assert!(matches!(err, StrategyError::BelowFrozen { .. }));
    }

    #[test]
    fn no_op_when_target_equals_current() {
        let mut state = ContextState::new();
        do_set_position(&mut state, &cfg(), "rb2410", 10, 3500.0, "s1", 1.0, 1.0, false, 0).unwrap();
        let (trades, closes) = do_set_position(&mut state, &cfg(), "rb2410", 10, 3510.0, "s1", 1.0, 1.0, false, 0).unwrap();
        assert!(trades.is_empty() && closes.is_empty());
    }
}
