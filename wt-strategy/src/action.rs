use crate::error::{Result, StrategyError};
use crate::queue::ContextState;
use crate::signal::set_position;

/// Reads a context's position for `code`: `only_valid` excludes
/// T+1-frozen volume, and a non-empty `user_tag` restricts the sum to
/// lots opened under that tag.
pub fn get_position(state: &ContextState, code: &str, only_valid: bool, user_tag: &str) -> i64 {
    let pos = state.position(code);
    if user_tag.is_empty() {
        if only_valid { pos.valid_volume() } else { pos.volume() }
    } else {
        pos.volume_by_tag(user_tag)
    }
}

/// Increases long exposure by `qty`. Sugar over `set_position` with the
/// target computed from the current net volume.
pub fn enter_long(state: &mut ContextState, code: &str, qty: i64, user_tag: &str, limit: f64, stop: f64) {
    let current = state.position(code).volume();
    set_position(state, code, current + qty, user_tag, limit, stop);
}

/// Reduces long exposure by up to `qty`, never flipping short: a long
/// holder can only give back what they hold.
pub fn exit_long(state: &mut ContextState, code: &str, qty: i64, user_tag: &str, limit: f64, stop: f64) {
    let current = state.position(code).volume();
    if current <= 0 {
        return;
    }
    set_position(state, code, (current - qty).max(0), user_tag, limit, stop);
}

/// Increases short exposure by `qty`. Rejected on contracts that don't
/// permit shorting.
pub fn enter_short(
    state: &mut ContextState,
    code: &str,
    qty: i64,
    can_short: bool,
    user_tag: &str,
    limit: f64,
    stop: f64,
) -> Result<()> {
    if !can_short {
        return Err(StrategyError::ShortNotAllowed);
    }
    let current = state.position(code).volume();
    set_position(state, code, current - qty, user_tag, limit, stop);
    Ok(())
}

/// Reduces short exposure by up to `qty`, never flipping long.
pub fn exit_short(state: &mut ContextState, code: &str, qty: i64, user_tag: &str, limit: f64, stop: f64) {
    let current = state.position(code).volume();
    if current >= 0 {
        return;
    }
    set_position(state, code, (current + qty).min(0), user_tag, limit, stop);
}
