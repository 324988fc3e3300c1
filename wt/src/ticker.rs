use indexmap::IndexMap;
use smol_str::SmolStr;
use wt_instrument::error::BaseDataError;
use wt_instrument::exchange::{full_code, Code, Exchange};
use wt_instrument::registry::BaseDataRegistry;

/// One notification the ticker raises when a quote crosses a minute,
/// bar, or session boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerEvent {
    /// The first tick ever seen for this code, or the first since its
    /// last [`SessionTicker::reset`] — the start of a new trading day.
    SessionBegin,
    /// The bar ending at session-minute `minute_idx` (exclusive) just
    /// closed for `period_minutes` (`1` or `5`).
    BarClose { period_minutes: u32, minute_idx: u32 },
    /// The contract's final section just closed for the trading date.
    SessionEnd,
}

#[derive(Debug, Default)]
struct CodeTickerState {
    last_minute_idx: Option<u32>,
}

/// Turns a forward-only tick stream into bar-close and session-end
/// events by comparing each tick's session-minute index against the
/// last one seen for that code. Carries no knowledge of
/// the bars' OHLCV content itself — that's [`wt_store::store::DataStore`]'s
/// job; the ticker only tells subscribers *when* to read it.
#[derive(Debug, Default)]
pub struct SessionTicker {
    state: IndexMap<SmolStr, CodeTickerState>,
}

impl SessionTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one tick's wall-clock `HHMM` and returns every boundary it
    /// just crossed, oldest first. A tick that doesn't advance the
    /// session-minute index (same minute as the previous tick) yields no
    /// events.
    pub fn on_tick(
        &mut self,
        registry: &BaseDataRegistry,
        exchange: &Exchange,
        code: &Code,
        hhmm: u32,
    ) -> Result<Vec<TickerEvent>, BaseDataError> {
        let contract = registry.contract(exchange, code)?;
        let session = registry.session_of(contract)?;

        let Some(minute_idx) = session.time_to_minutes(hhmm) else {
            return Ok(Vec::new());
        };

        let key = full_code(exchange, code);
        let entry = self.state.entry(key).or_default();

        let Some(last) = entry.last_minute_idx else {
            entry.last_minute_idx = Some(minute_idx);
            return Ok(vec![TickerEvent::SessionBegin]);
        };

        if minute_idx <= last {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for closed in last..minute_idx {
            events.push(TickerEvent::BarClose { period_minutes: 1, minute_idx: closed });
            if (closed + 1) % 5 == 0 {
                events.push(TickerEvent::BarClose { period_minutes: 5, minute_idx: closed });
            }
        }

        // A tick landing on a section's final minute closes that
        // minute's bar(s) immediately rather than waiting for a tick in
        // the following minute, which may never arrive before the
        // contract's session ends for the trading date.
        if session.is_last_of_section(hhmm) {
            events.push(TickerEvent::BarClose { period_minutes: 1, minute_idx });
            if (minute_idx + 1) % 5 == 0 {
                events.push(TickerEvent::BarClose { period_minutes: 5, minute_idx });
            }
            events.push(TickerEvent::SessionEnd);
        }

        entry.last_minute_idx = Some(minute_idx);
        Ok(events)
    }

    /// Forgets a code's ticker state, called after a session-close
    /// rollover so the next trading date starts from session-minute 0.
    pub fn reset(&mut self, exchange: &Exchange, code: &Code) {
        self.state.shift_remove(&full_code(exchange, code));
    }
}
