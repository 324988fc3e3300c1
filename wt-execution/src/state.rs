use serde::{Deserialize, Serialize};

/// Broker connection state machine:
/// ```text
/// NOTLOGIN -> LOGINING -> (LOGINED | LOGINFAILED)
/// LOGINED -> POSITION_QRYED -> ORDERS_QRYED -> TRADES_QRYED -> ALLREADY
/// any -> NOTLOGIN (on disconnect)
/// ```
/// Only `ALLREADY` is safe to route new order intents through; the
/// query chain between `LOGINED` and `ALLREADY` exists so position/order/
/// trade reconciliation always completes before the adapter accepts
/// strategy-driven traffic.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum ConnectionState {
    NotLogin,
    Logining,
    LoginFailed,
    Logined,
    PositionQryed,
    OrdersQryed,
    TradesQryed,
    AllReady,
}

impl ConnectionState {
    pub fn is_ready(self) -> bool {
        matches!(self, ConnectionState::AllReady)
    }

    /// The next state in the post-login reconciliation chain, or `None`
    /// once `AllReady` (nowhere further to advance) or from a state
    /// outside that chain.
    pub fn advance(self) -> Option<Self> {
        match self {
            ConnectionState::Logined => Some(ConnectionState::PositionQryed),
            ConnectionState::PositionQryed => Some(ConnectionState::OrdersQryed),
            ConnectionState::OrdersQryed => Some(ConnectionState::TradesQryed),
            ConnectionState::TradesQryed => Some(ConnectionState::AllReady),
            _ => None,
        }
    }

    /// Every state reverts to `NotLogin` on a disconnect.
    pub fn on_disconnect() -> Self {
        ConnectionState::NotLogin
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::NotLogin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_through_the_post_login_chain() {
        let mut state = ConnectionState::Logined;
        for expected in [
            ConnectionState::PositionQryed,
            ConnectionState::OrdersQryed,
            ConnectionState::TradesQryed,
            ConnectionState::AllReady,
        ] {
            state = state.advance().unwrap();
            assert_eq!(state, expected);
        }
        assert!(state.is_ready());
        assert!(state.advance().is_none());
    }

    #[test]
    fn not_login_has_no_post_login_advance() {
        assert!(ConnectionState::NotLogin.advance().is_none());
    }
}
