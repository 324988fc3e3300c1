use wt_instrument::exchange::{Code, Exchange};

use crate::error::ExecutionError;
use crate::id::BrokerOrderId;
use crate::order::{Direction, Offset, OrderFlag};

/// One concrete broker's wire binding, called synchronously from
/// [`crate::adapter::TraderAdapter`]. A venue's actual protocol (CTP,
/// esunny, or anything else) lives entirely behind this trait; the
/// adapter never sees a socket, a callback thread, or a wire struct.
///
/// Every method blocks the calling thread until the broker has
/// acknowledged the request (or it would time out); the adapter, not
/// this trait, owns reconciling that ack against local order state.
pub trait BrokerApi: Send {
    /// Authenticates and begins the post-login reconciliation sequence.
    /// Returns once login itself succeeds or fails; position/order/
    /// trade queries are separate calls the adapter issues afterward.
    fn login(&mut self) -> Result<(), ExecutionError>;

    fn logout(&mut self) -> Result<(), ExecutionError>;

    /// Submits a single child order (already split by
    /// [`crate::action_policy::split_close`]/`split_open`). Returns the
    /// broker's own order id on a synchronous accept; asynchronous
    /// rejects still arrive later via [`crate::callback::TraderSink::on_entrust`].
    fn insert_order(
        &mut self,
        exchange: &Exchange,
        code: &Code,
        direction: Direction,
        offset: Offset,
        price: f64,
        qty: i64,
        flag: OrderFlag,
    ) -> Result<BrokerOrderId, ExecutionError>;

    fn cancel_order(&mut self, broker_id: &BrokerOrderId) -> Result<(), ExecutionError>;

    /// Requests the current position snapshot; results arrive via
    /// [`crate::callback::TraderSink::on_position`] before this call
    /// returns.
    fn query_positions(&mut self) -> Result<(), ExecutionError>;

    /// Requests today's outstanding orders; results arrive via
    /// [`crate::callback::TraderSink::on_order`] before this call
    /// returns.
    fn query_orders(&mut self) -> Result<(), ExecutionError>;

    /// Requests today's trades; results arrive via
    /// [`crate::callback::TraderSink::on_trade`] before this call
    /// returns.
    fn query_trades(&mut self) -> Result<(), ExecutionError>;

    fn is_connected(&self) -> bool;
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A fake broker used across adapter tests: accepts every insert,
    /// hands out sequential broker ids, never rejects a cancel.
    #[derive(Default)]
    pub struct FakeBroker {
        pub connected: bool,
        next_id: AtomicU32,
    }

    impl BrokerApi for FakeBroker {
        fn login(&mut self) -> Result<(), ExecutionError> {
            self.connected = true;
            Ok(())
        }

        fn logout(&mut self) -> Result<(), ExecutionError> {
            self.connected = false;
            Ok(())
        }

        fn insert_order(
            &mut self,
            _exchange: &Exchange,
            _code: &Code,
            _direction: Direction,
            _offset: Offset,
            _price: f64,
            _qty: i64,
            _flag: OrderFlag,
        ) -> Result<BrokerOrderId, ExecutionError> {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            Ok(BrokerOrderId::new(format!("fake#{id}")))
        }

        fn cancel_order(&mut self, _broker_id: &BrokerOrderId) -> Result<(), ExecutionError> {
            Ok(())
        }

        fn query_positions(&mut self) -> Result<(), ExecutionError> {
            Ok(())
        }

        fn query_orders(&mut self) -> Result<(), ExecutionError> {
            Ok(())
        }

        fn query_trades(&mut self) -> Result<(), ExecutionError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }
}
