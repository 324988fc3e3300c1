use bytemuck::{Pod, Zeroable};

/// `px_type` value for a real, exchange-generated tick - the vast
/// majority of ticks ever written.
pub const PX_TYPE_REAL: u8 = 255;
/// `px_type` value for a bar's synthesized open pseudo-tick.
pub const PX_TYPE_OPEN: u8 = 0;
/// `px_type` value for a bar's synthesized high pseudo-tick.
pub const PX_TYPE_HIGH: u8 = 1;
/// `px_type` value for a bar's synthesized low pseudo-tick.
pub const PX_TYPE_LOW: u8 = 2;
/// `px_type` value for a bar's synthesized close pseudo-tick - the bar
/// has already ended, so order matching against this tick must not
/// reach for further fills as though the bar were still open.
pub const PX_TYPE_CLOSE: u8 = 3;

/// L1 market snapshot. Fixed little-endian layout shared by the RT and
/// HIS layers; `bytemuck::Pod` lets both mmap a `&[TickRecord]` directly
/// over the block payload with no per-record parsing.
///
/// `volume`/`turn_over`/`diff_interest` are *delta* fields derived from
/// the cumulative `total_volume`/`total_turnover`/`open_interest` at
/// write time; both the cumulative and delta views are kept because
/// downstream consumers (bar aggregation, strategy contexts) want the
/// delta and the archive wants the cumulative.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TickRecord {
    /// Calendar date the tick was generated on, `YYYYMMDD`.
    pub action_date: u32,
    /// Wall-clock timestamp, `HHMMSSmmm` (eg/ 09:00:30.000 -> 90030000).
    pub action_time: u32,
    pub trading_date: u32,
    pub _pad_header: [u8; 4],
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub settle_price: f64,
    pub total_volume: i64,
    pub volume: i64,
    pub total_turnover: f64,
    pub turn_over: f64,
    pub open_interest: i64,
    pub diff_interest: i64,
    pub pre_close: f64,
    pub pre_settle: f64,
    pub pre_interest: i64,
    pub upper_limit: f64,
    pub lower_limit: f64,
    pub bid_price: [f64; 5],
    pub ask_price: [f64; 5],
    pub bid_qty: [i64; 5],
    pub ask_qty: [i64; 5],
    /// `PX_TYPE_REAL` for a real tick, or one of `PX_TYPE_OPEN/HIGH/LOW/CLOSE`
    /// for a bar-replay pseudo-tick synthesized from OHLCV when a contract's
    /// archive has bars but no raw ticks for the day.
    pub px_type: u8,
    pub _pad_px_type: [u8; 7],
}

/// OHLCV record for a 1m/5m/d1 bar.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BarRecord {
    pub date: u32,
    pub time: u32,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub settle: f64,
    pub vol: i64,
    pub money: f64,
    pub hold: i64,
    pub add: i64,
    pub bid: f64,
    pub ask: f64,
}

/// L2 order-queue level snapshot (volume ladder at one price).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct OrderQueueRecord {
    pub action_date: u32,
    pub action_time: u32,
    pub trading_date: u32,
    pub side: u8,
    pub _pad: [u8; 3],
    pub price: f64,
    pub order_items: u32,
    pub qsize: u32,
    pub volumes: [i64; 50],
}

/// L2 per-order resting-detail record.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct OrderDetailRecord {
    pub action_date: u32,
    pub action_time: u32,
    pub trading_date: u32,
    pub side: u8,
    pub order_type: u8,
    pub _pad: [u8; 2],
    pub price: f64,
    pub order_qty: i64,
    pub order_index: i64,
}

/// L2 transaction (trade print) record.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TransactionRecord {
    pub action_date: u32,
    pub action_time: u32,
    pub trading_date: u32,
    pub side: u8,
    pub transaction_type: u8,
    pub _pad: [u8; 2],
    pub price: f64,
    pub volume: i64,
    pub ask_order: i64,
    pub bid_order: i64,
}
