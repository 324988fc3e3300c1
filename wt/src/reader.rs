use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use thiserror::Error;
use wt_instrument::exchange::{Code, Exchange};
use wt_store::error::StoreError;
use wt_store::record::{BarRecord, TickRecord, PX_TYPE_CLOSE, PX_TYPE_HIGH, PX_TYPE_LOW, PX_TYPE_OPEN, PX_TYPE_REAL};
use wt_store::store::DataStore;

/// Errors surfaced while reading live or historical market data.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("no archive for contract {exchange}.{code}")]
    ContractNotFound { exchange: String, code: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt archive for {exchange}.{code}: {reason}")]
    Corruption { exchange: String, code: String, reason: String },
}

impl From<StoreError> for ReaderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ContractNotFound { exchange, code } => ReaderError::ContractNotFound { exchange: exchange.to_string(), code: code.to_string() },
            StoreError::Corruption { exchange, code, reason, .. } => ReaderError::Corruption { exchange: exchange.to_string(), code: code.to_string(), reason },
            other => ReaderError::Corruption { exchange: String::new(), code: String::new(), reason: other.to_string() },
        }
    }
}

/// Unifies live tick/bar reads and ordered historical replay behind one
/// interface, so an [`crate::engine::Engine`] can be driven by either
/// without caring which.
pub trait DataReader {
    fn last_tick(&self, exchange: &Exchange, code: &Code) -> Result<Option<TickRecord>, ReaderError>;

    fn last_bars(&self, exchange: &Exchange, code: &Code, period_minutes: u32, count: usize) -> Result<Vec<BarRecord>, ReaderError>;
}

/// Wraps a live [`DataStore`], exposing its tail reads through
/// [`DataReader`].
#[derive(Debug, Clone)]
pub struct LiveReader {
    store: Arc<DataStore>,
}

impl LiveReader {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }
}

impl DataReader for LiveReader {
    fn last_tick(&self, exchange: &Exchange, code: &Code) -> Result<Option<TickRecord>, ReaderError> {
        Ok(self.store.last_tick(exchange, code))
    }

    fn last_bars(&self, exchange: &Exchange, code: &Code, period_minutes: u32, count: usize) -> Result<Vec<BarRecord>, ReaderError> {
        Ok(self.store.last_n_bars(exchange, code, period_minutes, count)?)
    }
}

/// Callback interface a [`HistoricalReplayer`] notifies as each
/// contract's archive finishes loading during [`HistoricalReplayer::prepare`],
/// so a caller can report load progress before replay starts.
pub trait ReaderSink {
    fn on_pack_ready(&mut self, exchange: &Exchange, code: &Code);

    fn on_notify_all_ready(&mut self);
}

/// One contract's tick stream plus a read cursor into it, fed to a
/// [`HistoricalReplayer`].
#[derive(Debug, Clone)]
pub struct SymbolFeed {
    pub exchange: Exchange,
    pub code: Code,
    pub ticks: Vec<TickRecord>,
    /// `Some((factor, adjusting_flag))`: back-adjustment factor applied
    /// to every tick's price fields, and which of {volume=1, turnover=2,
    /// open_interest=4} the flag bitmask also scales.
    pub adjustment: Option<(f64, u8)>,
}

impl SymbolFeed {
    pub fn new(exchange: Exchange, code: Code, ticks: Vec<TickRecord>) -> Self {
        Self { exchange, code, ticks, adjustment: None }
    }

    /// Synthesizes four pseudo-ticks per bar at open/high/low/close,
    /// spaced evenly within the bar's minute, for an archive that only
    /// has bars for the day. Downstream conditional-order matching must
    /// treat the close pseudo-tick as ending the bar: no further fills
    /// land within it.
    pub fn from_bars(exchange: Exchange, code: Code, bars: &[BarRecord]) -> Self {
        let mut ticks = Vec::with_capacity(bars.len() * 4);
        for bar in bars {
            let base_time = bar.time.saturating_sub(100_000); // bar.time names the minute the bar *closed at*
            let legs = [
                (0u32, bar.open, PX_TYPE_OPEN),
                (15_000, bar.high, PX_TYPE_HIGH),
                (30_000, bar.low, PX_TYPE_LOW),
                (45_000, bar.close, PX_TYPE_CLOSE),
            ];
            for (offset, price, px_type) in legs {
                ticks.push(TickRecord {
                    action_date: bar.date,
                    action_time: base_time + offset,
                    trading_date: bar.date,
                    _pad_header: [0; 4],
                    price,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    settle_price: bar.settle,
                    total_volume: bar.vol,
                    volume: bar.vol / 4,
                    total_turnover: bar.money,
                    turn_over: bar.money / 4.0,
                    open_interest: bar.hold,
                    diff_interest: 0,
                    pre_close: bar.open,
                    pre_settle: bar.settle,
                    pre_interest: bar.hold,
                    upper_limit: 0.0,
                    lower_limit: 0.0,
                    bid_price: [bar.bid; 5],
                    ask_price: [bar.ask; 5],
                    bid_qty: [0; 5],
                    ask_qty: [0; 5],
                    px_type,
                    _pad_px_type: [0; 7],
                });
            }
        }
        Self { exchange, code, ticks, adjustment: None }
    }

    fn apply_adjustment(&mut self) {
        let Some((factor, flag)) = self.adjustment else { return };
        for tick in &mut self.ticks {
            tick.price *= factor;
            tick.open *= factor;
            tick.high *= factor;
            tick.low *= factor;
            tick.settle_price *= factor;
            tick.pre_close *= factor;
            tick.pre_settle *= factor;
            for p in &mut tick.bid_price {
                *p *= factor;
            }
            for p in &mut tick.ask_price {
                *p *= factor;
            }
            if flag & 0b001 != 0 {
                tick.total_volume = (tick.total_volume as f64 * factor) as i64;
                tick.volume = (tick.volume as f64 * factor) as i64;
            }
            if flag & 0b010 != 0 {
                tick.total_turnover *= factor;
                tick.turn_over *= factor;
            }
            if flag & 0b100 != 0 {
                tick.open_interest = (tick.open_interest as f64 * factor) as i64;
                tick.diff_interest = (tick.diff_interest as f64 * factor) as i64;
            }
        }
    }
}

#[derive(Debug)]
struct Cursor {
    exchange: Exchange,
    code: Code,
    ticks: Vec<TickRecord>,
    next: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&TickRecord> {
        self.ticks.get(self.next)
    }
}

#[derive(Debug)]
struct HeapEntry {
    action_date: u32,
    action_time: u32,
    cursor: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.action_date == other.action_date && self.action_time == other.action_time
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest (date, time)
        // pops first.
        (other.action_date, other.action_time).cmp(&(self.action_date, self.action_time))
    }
}

/// A multi-symbol merge-sorted cursor over pre-loaded tick archives:
/// pops the single earliest-timestamped tick across every subscribed
/// contract on each [`HistoricalReplayer::next`] call, giving the engine
/// a deterministic, time-ordered replay regardless of how many symbols
/// are in the universe.
#[derive(Debug)]
pub struct HistoricalReplayer {
    cursors: Vec<Cursor>,
    heap: BinaryHeap<HeapEntry>,
}

impl HistoricalReplayer {
    /// Resolves the symbol universe, applies any back-adjustment, and
    /// seeds the merge heap with each contract's first tick, notifying
    /// `sink` as each contract's feed is ready and once more when every
    /// contract is.
    pub fn prepare(feeds: Vec<SymbolFeed>, sink: &mut dyn ReaderSink) -> Self {
        let mut cursors = Vec::with_capacity(feeds.len());
        let mut heap = BinaryHeap::with_capacity(feeds.len());

        for mut feed in feeds {
            feed.apply_adjustment();
            sink.on_pack_ready(&feed.exchange, &feed.code);

            let cursor_idx = cursors.len();
            if let Some(first) = feed.ticks.first() {
                heap.push(HeapEntry { action_date: first.action_date, action_time: first.action_time, cursor: cursor_idx });
            }
            cursors.push(Cursor { exchange: feed.exchange, code: feed.code, ticks: feed.ticks, next: 0 });
        }

        sink.on_notify_all_ready();
        Self { cursors, heap }
    }

    /// Pops the next tick in timestamp order, advancing that contract's
    /// cursor and re-seeding the heap with its following tick if any.
    pub fn next(&mut self) -> Option<(Exchange, Code, TickRecord)> {
        let entry = self.heap.pop()?;
        let cursor = &mut self.cursors[entry.cursor];
        let tick = *cursor.peek().expect("heap entry always names an unread tick");
        cursor.next += 1;

        if let Some(following) = cursor.peek() {
            self.heap.push(HeapEntry { action_date: following.action_date, action_time: following.action_time, cursor: entry.cursor });
        }

        Some((cursor.exchange.clone(), cursor.code.clone(), tick))
    }

    /// True once every cursor has been fully drained.
    pub fn is_exhausted(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Iterator for HistoricalReplayer {
    type Item = (Exchange, Code, TickRecord);

    fn next(&mut self) -> Option<Self::Item> {
        HistoricalReplayer::next(self)
    }
}
