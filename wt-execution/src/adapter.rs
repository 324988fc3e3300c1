use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use itertools::Itertools;
use smol_str::SmolStr;
use wt_instrument::contract::CoverMode;
use wt_instrument::exchange::{full_code, Code, Exchange};

use crate::action_policy::{self, ActionPolicyRule};
use crate::broker::BrokerApi;
use crate::callback::TraderSink;
use crate::config::ExecutionConfig;
use crate::entrust_cache::EntrustCache;
use crate::error::ExecutionError;
use crate::id::{BrokerOrderId, LocalOrderId, LocalOrderIdGenerator};
use crate::order::{Direction, OrderFlag, OrderTicket};
use crate::position::PosItem;
use crate::ratelimit::RateLimiter;
use crate::state::ConnectionState;
use crate::undone::UndoneTracker;

/// Ties the connection state machine, id translation, rate limiting,
/// undone-qty tracking and action-policy splitting into the single
/// entry point the engine drives. Talks to exactly one venue through a
/// [`BrokerApi`] and notifies exactly one [`TraderSink`].
pub struct TraderAdapter {
    state: ConnectionState,
    broker: Box<dyn BrokerApi>,
    sink: Box<dyn TraderSink>,
    id_gen: LocalOrderIdGenerator,
    orders: IndexMap<LocalOrderId, OrderTicket>,
    broker_to_local: IndexMap<BrokerOrderId, LocalOrderId>,
    entrust_cache: EntrustCache,
    rate_limiter: RateLimiter,
    undone: UndoneTracker,
    action_policy: Vec<ActionPolicyRule>,
    positions: IndexMap<SmolStr, PosItem>,
    tradingday: Option<u32>,
}

impl std::fmt::Debug for TraderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraderAdapter")
            .field("state", &self.state)
            .field("orders", &self.orders.len())
            .finish_non_exhaustive()
    }
}

impl TraderAdapter {
    pub fn new(
        config: ExecutionConfig,
        broker: Box<dyn BrokerApi>,
        sink: Box<dyn TraderSink>,
    ) -> Result<Self, ExecutionError> {
        let entrust_cache = EntrustCache::open(&config.entrust_cache_path, 256)?;
        Ok(Self {
            state: ConnectionState::default(),
            broker,
            sink,
            id_gen: LocalOrderIdGenerator::default(),
            orders: IndexMap::new(),
            broker_to_local: IndexMap::new(),
            entrust_cache,
            rate_limiter: RateLimiter::new(config.order_limits, config.cancel_limits),
            undone: UndoneTracker::new(),
            action_policy: config.action_policy,
            positions: IndexMap::new(),
            tradingday: None,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Logs in and drives the post-login position/order/trade
    /// reconciliation chain to completion, firing
    /// [`TraderSink::on_channel_ready`] once [`ConnectionState::AllReady`]
    /// is reached.
    pub fn connect(&mut self) -> Result<(), ExecutionError> {
        self.state = ConnectionState::Logining;
        match self.broker.login() {
            Ok(()) => {
                self.state = ConnectionState::Logined;
                self.drive_reconciliation()
            }
            Err(e) => {
                self.state = ConnectionState::LoginFailed;
                Err(e)
            }
        }
    }

    fn drive_reconciliation(&mut self) -> Result<(), ExecutionError> {
        loop {
            match self.state {
                ConnectionState::Logined => self.broker.query_positions()?,
                ConnectionState::PositionQryed => self.broker.query_orders()?,
                ConnectionState::OrdersQryed => self.broker.query_trades()?,
                ConnectionState::TradesQryed => {}
                ConnectionState::AllReady => {
                    self.sink.on_channel_ready(self.tradingday.unwrap_or(0));
                    return Ok(());
                }
                _ => return Ok(()),
            }
            self.state = self.state.advance().unwrap_or(self.state);
        }
    }

    /// A broker-initiated disconnect: reverts to [`ConnectionState::NotLogin`]
    /// and marks every still-outstanding order's true status unknown
    /// rather than assuming it filled or canceled; only the
    /// post-reconnect order/trade query resolves it.
    pub fn on_disconnect(&mut self) {
        self.state = ConnectionState::on_disconnect();
        for ticket in self.orders.values_mut() {
            if !ticket.is_done() {
                ticket.unknown = true;
            }
        }
        self.sink.on_channel_lost();
    }

    /// Records a position-query reply line and forwards it to the sink,
    /// one call per side actually held.
    pub fn record_position(&mut self, exchange: &Exchange, code: &Code, tradingday: u32, pos: PosItem) {
        self.tradingday = Some(tradingday);
        let key = full_code(exchange, code);
        if pos.long_total() != 0 {
            self.sink.on_position(
                code.as_str(),
                true,
                pos.l_prevol,
                pos.l_preavail,
                pos.l_newvol,
                pos.l_newavail,
                tradingday,
            );
        }
        if pos.short_total() != 0 {
            self.sink.on_position(
                code.as_str(),
                false,
                pos.s_prevol,
                pos.s_preavail,
                pos.s_newvol,
                pos.s_newavail,
                tradingday,
            );
        }
        self.positions.insert(key, pos);
    }

    pub fn position(&self, exchange: &Exchange, code: &Code) -> PosItem {
        self.positions.get(&full_code(exchange, code)).copied().unwrap_or_default()
    }

    pub fn buy(
        &mut self,
        now: DateTime<Utc>,
        exchange: Exchange,
        code: Code,
        product: &str,
        is_close: bool,
        price: f64,
        qty: i64,
        flag: OrderFlag,
        cover_mode: CoverMode,
        user_tag: &str,
    ) -> Result<Vec<LocalOrderId>, ExecutionError> {
        self.place(now, exchange, code, product, Direction::Long, is_close, price, qty, flag, cover_mode, user_tag)
    }

    pub fn sell(
        &mut self,
        now: DateTime<Utc>,
        exchange: Exchange,
        code: Code,
        product: &str,
        is_close: bool,
        price: f64,
        qty: i64,
        flag: OrderFlag,
        cover_mode: CoverMode,
        user_tag: &str,
    ) -> Result<Vec<LocalOrderId>, ExecutionError> {
        self.place(now, exchange, code, product, Direction::Short, is_close, price, qty, flag, cover_mode, user_tag)
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &mut self,
        now: DateTime<Utc>,
        exchange: Exchange,
        code: Code,
        product: &str,
        trade_direction: Direction,
        is_close: bool,
        price: f64,
        qty: i64,
        flag: OrderFlag,
        cover_mode: CoverMode,
        user_tag: &str,
    ) -> Result<Vec<LocalOrderId>, ExecutionError> {
        if !self.state.is_ready() {
            return Err(ExecutionError::NotConnected);
        }
        let full = full_code(&exchange, &code);
        self.rate_limiter.check_order_limits(&full, now)?;

        let children = if is_close {
            let pos = self.position(&exchange, &code);
            action_policy::split_close(product, trade_direction.opposite(), qty, cover_mode, &pos, &self.action_policy)?
        } else {
            vec![action_policy::split_open(product, trade_direction, qty, &self.action_policy)]
        };

        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            if child.qty <= 0 {
                continue;
            }
            let local_id = self.id_gen.next();
            let broker_id =
                self.broker.insert_order(&exchange, &code, trade_direction, child.offset, price, child.qty, flag)?;
            self.entrust_cache.put(&local_id.to_string(), broker_id.0.as_str())?;
            self.broker_to_local.insert(broker_id.clone(), local_id);
            self.undone.on_order_placed(&full, trade_direction, child.qty);
            self.sink.on_entrust(local_id.0, code.as_str(), true, "", user_tag);
            self.orders.insert(
                local_id,
                OrderTicket {
                    local_id,
                    broker_id: Some(broker_id),
                    exchange: exchange.clone(),
                    code: code.clone(),
                    direction: trade_direction,
                    offset: child.offset,
                    price,
                    total_qty: child.qty,
                    left_qty: child.qty,
                    flag,
                    canceled: false,
                    unknown: false,
                    user_tag: SmolStr::new(user_tag),
                },
            );
            ids.push(local_id);
        }
        Ok(ids)
    }

    pub fn cancel(&mut self, now: DateTime<Utc>, local_id: LocalOrderId) -> Result<(), ExecutionError> {
        let ticket = self
            .orders
            .get(&local_id)
            .ok_or(ExecutionError::UnknownLocalOrder(local_id.0))?;
        let full = full_code(&ticket.exchange, &ticket.code);
        self.rate_limiter.check_cancel_limits(&full, now)?;
        let broker_id = ticket
            .broker_id
            .clone()
            .ok_or_else(|| ExecutionError::CancelRejected("order has no broker id yet".to_string()))?;
        self.broker.cancel_order(&broker_id)
    }

    /// Applies a fill reported by the broker against the local order
    /// book, updates undone-qty and notifies the sink.
    pub fn on_filled(&mut self, broker_id: &BrokerOrderId, fill_qty: i64, fill_price: f64) -> Result<(), ExecutionError> {
        let local_id = *self
            .broker_to_local
            .get(broker_id)
            .ok_or_else(|| ExecutionError::UnknownBrokerOrder(broker_id.0.clone()))?;
        let ticket = self
            .orders
            .get_mut(&local_id)
            .ok_or(ExecutionError::UnknownLocalOrder(local_id.0))?;
        ticket.left_qty = (ticket.left_qty - fill_qty).max(0);
        ticket.unknown = false;
        let full = full_code(&ticket.exchange, &ticket.code);
        self.undone.on_order_settled(&full, ticket.direction, fill_qty);
        self.sink
            .on_trade(local_id.0, ticket.code.as_str(), ticket.direction.is_long(), fill_qty, fill_price, ticket.user_tag.as_str());
        self.sink.on_order(
            local_id.0,
            ticket.code.as_str(),
            ticket.direction.is_long(),
            ticket.total_qty,
            ticket.left_qty,
            ticket.price,
            ticket.canceled,
            ticket.user_tag.as_str(),
        );
        Ok(())
    }

    /// Applies a cancel confirmation: whatever quantity was still
    /// working is no longer outstanding.
    pub fn on_canceled(&mut self, broker_id: &BrokerOrderId) -> Result<(), ExecutionError> {
        let local_id = *self
            .broker_to_local
            .get(broker_id)
            .ok_or_else(|| ExecutionError::UnknownBrokerOrder(broker_id.0.clone()))?;
        let ticket = self
            .orders
            .get_mut(&local_id)
            .ok_or(ExecutionError::UnknownLocalOrder(local_id.0))?;
        ticket.canceled = true;
        ticket.unknown = false;
        let full = full_code(&ticket.exchange, &ticket.code);
        let left = ticket.left_qty;
        self.undone.on_order_settled(&full, ticket.direction, left);
        self.sink.on_order(
            local_id.0,
            ticket.code.as_str(),
            ticket.direction.is_long(),
            ticket.total_qty,
            ticket.left_qty,
            ticket.price,
            true,
            ticket.user_tag.as_str(),
        );
        Ok(())
    }

    pub fn undone_qty(&self, exchange: &Exchange, code: &Code) -> i64 {
        self.undone.undone_qty(&full_code(exchange, code))
    }

    /// Every order this adapter still considers outstanding, local id
    /// ascending.
    pub fn outstanding_orders(&self) -> Vec<&OrderTicket> {
        self.orders.values().filter(|t| !t.is_done()).sorted_by_key(|t| t.local_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::tests_support::FakeBroker;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl TraderSink for RecordingSink {
        fn on_order(&self, local_id: u32, code: &str, is_long: bool, total: i64, left: i64, _price: f64, canceled: bool, _tag: &str) {
            self.events.lock().push(format!("order:{local_id}:{code}:{is_long}:{total}:{left}:{canceled}"));
        }
        fn on_trade(&self, local_id: u32, code: &str, is_long: bool, vol: i64, _price: f64, _tag: &str) {
            self.events.lock().push(format!("trade:{local_id}:{code}:{is_long}:{vol}"));
        }
        fn on_entrust(&self, local_id: u32, code: &str, success: bool, _msg: &str, _tag: &str) {
            self.events.lock().push(format!("entrust:{local_id}:{code}:{success}"));
        }
        fn on_channel_ready(&self, tradingday: u32) {
            self.events.lock().push(format!("ready:{tradingday}"));
        }
        fn on_channel_lost(&self) {
            self.events.lock().push("lost".to_string());
        }
        fn on_position(&self, code: &str, is_long: bool, prevol: i64, _preavail: i64, newvol: i64, _newavail: i64, _tradingday: u32) {
            self.events.lock().push(format!("position:{code}:{is_long}:{prevol}:{newvol}"));
        }
    }

    fn adapter() -> (TraderAdapter, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ExecutionConfig {
            entrust_cache_path: dir.path().join("entrust.kv"),
            ..Default::default()
        };
        let adapter = TraderAdapter::new(config, Box::new(FakeBroker::default()), Box::<RecordingSink>::default())
            .unwrap();
        (adapter, dir)
    }

    #[test]
    fn connect_drives_straight_to_all_ready() {
        let (mut adapter, _dir) = adapter();
        adapter.connect().unwrap();
        assert_eq!(adapter.state(), ConnectionState::AllReady);
    }

    #[test]
    fn order_is_rejected_before_the_channel_is_ready() {
        let (mut adapter, _dir) = adapter();
        let err = adapter
            .buy(
                Utc::now(),
                Exchange::new("SHFE"),
                Code::new("rb2410"),
                "rb",
                false,
                3500.0,
                5,
                OrderFlag::Nor,
                CoverMode::CloseToday,
                "",
            )
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NotConnected));
    }

    #[test]
    fn opening_buy_assigns_a_local_id_and_tracks_undone_qty() {
        let (mut adapter, _dir) = adapter();
        adapter.connect().unwrap();
        let ids = adapter
            .buy(
                Utc::now(),
                Exchange::new("SHFE"),
                Code::new("rb2410"),
                "rb",
                false,
                3500.0,
                5,
                OrderFlag::Nor,
                CoverMode::CloseToday,
                "sig1",
            )
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(adapter.undone_qty(&Exchange::new("SHFE"), &Code::new("rb2410")), 5);
        assert_eq!(adapter.outstanding_orders().len(), 1);
    }

    #[test]
    fn closing_sell_under_close_today_splits_into_two_local_orders() {
        let (mut adapter, _dir) = adapter();
        adapter.connect().unwrap();
        let exchange = Exchange::new("SHFE");
        let code = Code::new("rb2410");
        adapter.record_position(
            &exchange,
            &code,
            20260801,
            PosItem { l_prevol: 3, l_preavail: 3, l_newvol: 7, l_newavail: 7, ..Default::default() },
        );
        let ids = adapter
            .sell(Utc::now(), exchange, code, "rb", true, 3500.0, 10, OrderFlag::Nor, CoverMode::CloseToday, "")
            .unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn fill_reduces_left_qty_and_undone_qty() {
        let (mut adapter, _dir) = adapter();
        adapter.connect().unwrap();
        let exchange = Exchange::new("SHFE");
        let code = Code::new("rb2410");
        let ids = adapter
            .buy(Utc::now(), exchange.clone(), code.clone(), "rb", false, 3500.0, 5, OrderFlag::Nor, CoverMode::CloseToday, "")
            .unwrap();
        let broker_id = adapter.orders.get(&ids[0]).unwrap().broker_id.clone().unwrap();
        adapter.on_filled(&broker_id, 5, 3500.0).unwrap();
        assert_eq!(adapter.undone_qty(&exchange, &code), 0);
        assert!(adapter.outstanding_orders().is_empty());
    }

    #[test]
    fn disconnect_marks_outstanding_orders_unknown_and_notifies_sink() {
        let (mut adapter, _dir) = adapter();
        adapter.connect().unwrap();
        adapter
            .buy(Utc::now(), Exchange::new("SHFE"), Code::new("rb2410"), "rb", false, 3500.0, 5, OrderFlag::Nor, CoverMode::CloseToday, "")
            .unwrap();
        adapter.on_disconnect();
        assert_eq!(adapter.state(), ConnectionState::NotLogin);
        assert!(adapter.orders.values().next().unwrap().unknown);
    }
}
