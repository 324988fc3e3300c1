use smol_str::SmolStr;

use crate::model::{Comparator, CondOrder, Signal, SignalKind};
use crate::queue::ContextState;

/// Implements `set_position`: either enqueues an immediate signal
/// applied on the code's next tick, or derives one or two conditional
/// orders from `limit`/`stop`. A no-op when the target already matches
/// the current position.
pub fn set_position(state: &mut ContextState, code: &str, target_qty: i64, user_tag: &str, limit: f64, stop: f64) {
    let current = state.position(code).volume();
    if current == target_qty {
        return;
    }

    if limit == 0.0 && stop == 0.0 {
        state.queue_signal(
            code,
            Signal { target_qty, user_tag: SmolStr::new(user_tag), kind: SignalKind::Immediate },
        );
        return;
    }

    let buying = target_qty > current;
    let (stop_cmp, limit_cmp) = if buying {
        (Comparator::Ge, Comparator::Le)
    } else {
        (Comparator::Le, Comparator::Ge)
    };

    if stop > 0.0 {
        state.push_conditional(
            code,
            CondOrder { target_qty, target_price: stop, comparator: stop_cmp, user_tag: SmolStr::new(user_tag) },
        );
    }
    if limit > 0.0 {
        state.push_conditional(
            code,
            CondOrder { target_qty, target_price: limit, comparator: limit_cmp, user_tag: SmolStr::new(user_tag) },
        );
    }
}

/// Resolves a just-fired conditional order into the `Signal` the tick
/// handler applies, tagged `ConditionFired` rather than `Immediate`.
pub fn signal_from_trigger(target_qty: i64, exec_price: f64, user_tag: &str) -> (Signal, f64) {
    (
        Signal { target_qty, user_tag: SmolStr::new(user_tag), kind: SignalKind::ConditionFired },
        exec_price,
    )
}
