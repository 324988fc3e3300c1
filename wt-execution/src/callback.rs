/// Strategy/engine-facing notifications pushed by the trader adapter.
/// An implementor is typically the engine's order router, fanning each
/// callback out to whichever strategy context owns `user_tag`.
pub trait TraderSink: Send + Sync {
    /// An order's state changed: a fresh ack, a partial fill, or a
    /// cancel confirmation. `left_qty` is what remains working.
    fn on_order(
        &self,
        local_id: u32,
        code: &str,
        is_long: bool,
        total_qty: i64,
        left_qty: i64,
        price: f64,
        is_canceled: bool,
        user_tag: &str,
    );

    /// A fill. May fire more than once per order (partial fills).
    fn on_trade(&self, local_id: u32, code: &str, is_long: bool, vol: i64, price: f64, user_tag: &str);

    /// The broker's synchronous ack/reject of an insert or cancel
    /// request, before any order-state update arrives.
    fn on_entrust(&self, local_id: u32, code: &str, success: bool, msg: &str, user_tag: &str);

    /// Login plus the post-login position/order/trade reconciliation
    /// queries have all completed; the adapter is in
    /// [`crate::state::ConnectionState::AllReady`].
    fn on_channel_ready(&self, tradingday: u32);

    /// The broker connection dropped. Every order this adapter still
    /// considered outstanding is now of genuinely unknown status —
    /// not assumed filled, not assumed canceled — until the
    /// post-reconnect order/trade query resolves it.
    fn on_channel_lost(&self);

    /// One line of the post-login position snapshot, one call per
    /// direction actually held (a flat direction is not reported).
    fn on_position(
        &self,
        code: &str,
        is_long: bool,
        prevol: i64,
        preavail: i64,
        newvol: i64,
        newavail: i64,
        tradingday: u32,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        channel_lost: Mutex<u32>,
        ready_tradingday: Mutex<Option<u32>>,
    }

    impl TraderSink for RecordingSink {
        fn on_order(&self, _: u32, _: &str, _: bool, _: i64, _: i64, _: f64, _: bool, _: &str) {}
        fn on_trade(&self, _: u32, _: &str, _: bool, _: i64, _: f64, _: &str) {}
        fn on_entrust(&self, _: u32, _: &str, _: bool, _: &str, _: &str) {}

        fn on_channel_ready(&self, tradingday: u32) {
            *self.ready_tradingday.lock() = Some(tradingday);
        }

        fn on_channel_lost(&self) {
            *self.channel_lost.lock() += 1;
        }

        fn on_position(&self, _: &str, _: bool, _: i64, _: i64, _: i64, _: i64, _: u32) {}
    }

    #[test]
    fn channel_lost_is_observable_independent_of_order_callbacks() {
        let sink = RecordingSink::default();
        sink.on_channel_lost();
        sink.on_channel_ready(20260801);
        assert_eq!(*sink.channel_lost.lock(), 1);
        assert_eq!(*sink.ready_tradingday.lock(), Some(20260801));
    }
}
