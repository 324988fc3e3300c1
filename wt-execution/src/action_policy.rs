use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use wt_instrument::contract::CoverMode;

use crate::error::ExecutionError;
use crate::order::{Direction, Offset};
use crate::position::PosItem;

/// How a child order's quantity is computed once the offset split
/// (open vs. close-today vs. close-yesterday) is known.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum QtyRule {
    /// Use the quantity as provided by the caller (capped by whatever
    /// the position split already bounded it to).
    BySpec,
    /// Cap at whatever is actually available in that bucket.
    ByAvail,
    /// Ignore the requested quantity; use the full current position in
    /// that bucket (a "flatten this leg" rule).
    ByCurrent,
}

/// One row of the action-policy table: `product` is a commodity code
/// (eg/ `"rb"`), matched against a contract's `ContractInfo::product`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActionPolicyRule {
    pub product: SmolStr,
    pub direction: Direction,
    pub offset: Offset,
    pub qty_rule: QtyRule,
}

/// A single child order recipe produced by [`split_close`]/[`apply`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildOrder {
    pub offset: Offset,
    pub qty: i64,
}

fn find_rule<'a>(
    table: &'a [ActionPolicyRule],
    product: &str,
    direction: Direction,
    offset: Offset,
) -> Option<&'a ActionPolicyRule> {
    table
        .iter()
        .find(|r| r.product == product && r.direction == direction && r.offset == offset)
}

fn apply_qty_rule(
    table: &[ActionPolicyRule],
    product: &str,
    direction: Direction,
    offset: Offset,
    spec_qty: i64,
    avail: i64,
    current: i64,
) -> i64 {
    match find_rule(table, product, direction, offset).map(|r| r.qty_rule) {
        Some(QtyRule::ByAvail) => spec_qty.min(avail),
        Some(QtyRule::ByCurrent) => current,
        Some(QtyRule::BySpec) | None => spec_qty.min(avail),
    }
}

/// Splits a close intent into 1..N child orders with concrete
/// open/close/closetoday offsets. `closing_direction` is the
/// *position's* direction being closed (a sell closes a long, a buy
/// closes a short).
pub fn split_close(
    product: &str,
    closing_direction: Direction,
    qty: i64,
    cover_mode: CoverMode,
    pos: &PosItem,
    table: &[ActionPolicyRule],
) -> Result<Vec<ChildOrder>, ExecutionError> {
    if matches!(cover_mode, CoverMode::OpenOnly) {
        return Err(ExecutionError::InsertRejected(
            "contract only permits opening positions, cannot close".to_string(),
        ));
    }

    let (pre_avail, pre_total, new_avail, new_total) = match closing_direction {
        Direction::Long => (pos.l_preavail, pos.l_prevol, pos.l_newavail, pos.l_newvol),
        Direction::Short => (pos.s_preavail, pos.s_prevol, pos.s_newavail, pos.s_newvol),
    };

    if matches!(cover_mode, CoverMode::CloseToday) {
        let yesterday_qty = apply_qty_rule(
            table,
            product,
            closing_direction,
            Offset::CloseYesterday,
            qty.min(pre_avail),
            pre_avail,
            pre_total,
        );
        let remaining = (qty - yesterday_qty).max(0);
        let today_qty = apply_qty_rule(
            table,
            product,
            closing_direction,
            Offset::CloseToday,
            remaining.min(new_avail),
            new_avail,
            new_total,
        );

        let mut children = Vec::new();
        if yesterday_qty > 0 {
            children.push(ChildOrder { offset: Offset::CloseYesterday, qty: yesterday_qty });
        }
        if today_qty > 0 {
            children.push(ChildOrder { offset: Offset::CloseToday, qty: today_qty });
        }
        Ok(children)
    } else {
        let qty = apply_qty_rule(
            table,
            product,
            closing_direction,
            Offset::Close,
            qty,
            pre_avail + new_avail,
            pre_total + new_total,
        );
        Ok(vec![ChildOrder { offset: Offset::Close, qty }])
    }
}

/// Builds the single child order for an opening intent. Opening never
/// splits across today/yesterday lots; the qty rule (if a matching
/// policy row exists) still applies.
pub fn split_open(
    product: &str,
    direction: Direction,
    qty: i64,
    table: &[ActionPolicyRule],
) -> ChildOrder {
    let qty = match find_rule(table, product, direction, Offset::Open).map(|r| r.qty_rule) {
        Some(QtyRule::ByCurrent) | Some(QtyRule::ByAvail) | Some(QtyRule::BySpec) | None => qty,
    };
    ChildOrder { offset: Offset::Open, qty }
}
