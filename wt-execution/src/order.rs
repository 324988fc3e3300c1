use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use wt_instrument::exchange::{Code, Exchange};

use crate::id::{BrokerOrderId, LocalOrderId};

/// Buy or sell side, kept distinct from `open`/`close` ([`Offset`]):
/// direction and offset compose independently (a close-long is a sell,
/// a close-short is a buy).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn is_long(self) -> bool {
        matches!(self, Direction::Long)
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

/// Open vs. close, with close further split for `CoverMode::CloseToday`
/// venues: closing must distinguish today's lots from yesterday's.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum Offset {
    Open,
    CloseToday,
    CloseYesterday,
    /// Close without distinguishing lot age (`CoverMode::CoverAny`
    /// venues, or any venue when the split isn't required).
    Close,
}

/// Strategy-emitted order flag: maps to a broker
/// time-in-force/volume-condition pair at the execution boundary, a
/// contract fact rather than a policy choice.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum OrderFlag {
    /// Normal: good-for-day, any volume (partial fills allowed).
    Nor,
    /// Fill-and-kill: immediate-or-cancel, any volume.
    Fak,
    /// Fill-or-kill: immediate-or-cancel, complete volume only.
    Fok,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum TimeInForce {
    /// Good for day.
    Gfd,
    /// Immediate or cancel.
    Ioc,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum VolumeCondition {
    /// Partial fills accepted.
    AnyVolume,
    /// All-or-nothing.
    CompleteVolume,
}

impl OrderFlag {
    pub fn to_broker(self) -> (TimeInForce, VolumeCondition) {
        match self {
            OrderFlag::Nor => (TimeInForce::Gfd, VolumeCondition::AnyVolume),
            OrderFlag::Fak => (TimeInForce::Ioc, VolumeCondition::AnyVolume),
            OrderFlag::Fok => (TimeInForce::Ioc, VolumeCondition::CompleteVolume),
        }
    }
}

/// One order as tracked by the adapter, from the moment a
/// [`LocalOrderId`] is assigned through to its terminal state. CFFEX
/// market orders translate to "best-five-levels price" rather than a
/// true market order — callers pass that price in already computed;
/// this type doesn't special-case the exchange.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderTicket {
    pub local_id: LocalOrderId,
    pub broker_id: Option<BrokerOrderId>,
    pub exchange: Exchange,
    pub code: Code,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    pub total_qty: i64,
    pub left_qty: i64,
    pub flag: OrderFlag,
    pub canceled: bool,
    /// True once a disconnect leaves this order's true state unknown
    /// until the post-reconnect query resolves it — distinct from
    /// `canceled`.
    pub unknown: bool,
    pub user_tag: SmolStr,
}

impl OrderTicket {
    pub fn signed_qty(&self) -> i64 {
        if self.direction.is_long() {
            self.left_qty
        } else {
            -self.left_qty
        }
    }

    pub fn is_done(&self) -> bool {
        self.left_qty == 0 || self.canceled
    }
}
