use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use wt_execution::order::Direction;

/// One FIFO lot within a position. Opening a position appends a
/// detail; reducing/flipping consumes details front-to-back from
/// `valid_idx` onward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDetail {
    pub direction: Direction,
    pub open_price: f64,
    pub volume: i64,
    pub closed_volume: i64,
    pub open_cost: f64,
    pub closed_profit: f64,
    pub dyn_profit: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    pub max_price: f64,
    pub min_price: f64,
    pub last_enter_time: u32,
    pub open_tag: SmolStr,
}

impl PositionDetail {
    pub fn new(direction: Direction, price: f64, volume: i64, open_tag: impl Into<SmolStr>, enter_time: u32) -> Self {
        Self {
            direction,
            open_price: price,
            volume,
            closed_volume: 0,
            open_cost: price * volume as f64,
            closed_profit: 0.0,
            dyn_profit: 0.0,
            max_profit: 0.0,
            max_loss: 0.0,
            max_price: price,
            min_price: price,
            last_enter_time: enter_time,
            open_tag: open_tag.into(),
        }
    }

    /// Updates `dyn_profit` and the running max/min attribution for a
    /// new market price.
    pub fn mark(&mut self, price: f64, vol_scale: f64) {
        let sign = if self.direction.is_long() { 1.0 } else { -1.0 };
        self.dyn_profit = self.volume as f64 * (price - self.open_price) * vol_scale * sign;
        self.max_profit = self.max_profit.max(self.dyn_profit);
        self.max_loss = self.max_loss.min(self.dyn_profit);
        self.max_price = self.max_price.max(price);
        self.min_price = self.min_price.min(price);
    }
}

/// All FIFO lots for one contract, plus the T+1 frozen-volume tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosInfo {
    pub details: Vec<PositionDetail>,
    /// Index of the oldest detail not yet fully closed; lots before
    /// this are fully consumed and kept only for history.
    pub valid_idx: usize,
    /// Volume opened today that cannot be closed today (T+1 contracts).
    pub frozen: i64,
}

impl PosInfo {
    /// Net signed volume: long lots positive, short lots negative.
    pub fn volume(&self) -> i64 {
        self.details[self.valid_idx..]
            .iter()
            .map(|d| if d.direction.is_long() { d.volume } else { -d.volume })
            .sum()
    }

    /// `volume - frozen`, a long-only "valid" semantics (short
    /// positions are treated as always having `frozen == 0`).
    pub fn valid_volume(&self) -> i64 {
        let total = self.volume();
        if total > 0 {
            total - self.frozen
        } else {
            total
        }
    }

    /// Sum over details whose `open_tag == user_tag`.
    pub fn volume_by_tag(&self, user_tag: &str) -> i64 {
        self.details[self.valid_idx..]
            .iter()
            .filter(|d| d.open_tag == user_tag)
            .map(|d| if d.direction.is_long() { d.volume } else { -d.volume })
            .sum()
    }

    /// Total profit already realized across every detail, including
    /// fully-closed ones before `valid_idx`.
    pub fn closed_profit(&self) -> f64 {
        self.details.iter().map(|d| d.closed_profit).sum()
    }

    /// Total mark-to-market profit on still-open volume.
    pub fn dyn_profit(&self) -> f64 {
        self.details[self.valid_idx..].iter().map(|d| d.dyn_profit).sum()
    }
}

/// Aggregate P&L for a context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FundInfo {
    pub total_profit: f64,
    pub total_closed_profit: f64,
    pub total_fees: f64,
}

/// Whether a pending signal is a plain target-position intent or the
/// result of a conditional order firing; only the latter invokes
/// `on_condition_triggered`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum SignalKind {
    Immediate,
    ConditionFired,
}

/// A target-position intent queued for application on the next tick of
/// its code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub target_qty: i64,
    pub user_tag: SmolStr,
    pub kind: SignalKind,
}

/// Price-trigger comparator for a conditional order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Comparator {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
}

impl Comparator {
    /// True if `value` satisfies the comparator against `target`.
    pub fn test(self, value: f64, target: f64) -> bool {
        match self {
            Comparator::Ge => value >= target,
            Comparator::Gt => value > target,
            Comparator::Le => value <= target,
            Comparator::Lt => value < target,
            Comparator::Eq => value == target,
        }
    }

    /// Whether this is one of the "buying rises into target" family
    /// (`>=`/`>`), used by the same-comparator tie-break rule: the
    /// smaller target wins among `>=`/`>` orders.
    pub fn is_upward(self) -> bool {
        matches!(self, Comparator::Ge | Comparator::Gt)
    }

    pub fn is_downward(self) -> bool {
        matches!(self, Comparator::Le | Comparator::Lt)
    }
}

/// A conditional order created by `set_position` when `limit`/`stop`
/// were non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondOrder {
    pub target_qty: i64,
    pub target_price: f64,
    pub comparator: Comparator,
    pub user_tag: SmolStr,
}

/// One leg of a multi-level stop/take-profit ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitLevel {
    pub trigger_price: f64,
    pub exit_fraction: f64,
}

/// An ordered ladder of partial exits, consumed front-to-back as price
/// crosses successive levels; at most one level fires per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLevelExit {
    pub comparator: Comparator,
    pub levels: Vec<ExitLevel>,
    pub next_level: usize,
}

impl MultiLevelExit {
    pub fn new(comparator: Comparator, levels: Vec<ExitLevel>) -> Self {
        Self { comparator, levels, next_level: 0 }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_level >= self.levels.len()
    }

    pub fn pending(&self) -> Option<ExitLevel> {
        self.levels.get(self.next_level).copied()
    }
}
