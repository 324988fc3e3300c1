use bytemuck::{Pod, Zeroable};

pub const BLOCK_MAGIC: u32 = 0x5754_4442; // "WTDB"

/// Header versions. `RawV1` is the original uncompressed RT/HIS layout;
/// `RawV2` adds the `trading_date` field to the header so a reader can
/// validate a block without touching its first record; `CmpV2` marks a
/// HIS archive payload as lz4-compressed (written by session-close
/// rollover).
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlockVersion {
    RawV1 = 1,
    RawV2 = 2,
    CmpV2 = 3,
}

impl BlockVersion {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(BlockVersion::RawV1),
            2 => Some(BlockVersion::RawV2),
            3 => Some(BlockVersion::CmpV2),
            _ => None,
        }
    }

    pub fn is_compressed(self) -> bool {
        matches!(self, BlockVersion::CmpV2)
    }
}

/// Fixed header prefixing both RT and HIS block payloads. `size` is the
/// field a single-writer mutates under the block's writer lock; readers
/// read it unlocked and slice `[0, size)` of the payload. A reader that
/// observes `size > capacity` (file just grew, mapping is stale) must
/// re-map before trusting the payload.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BlockHeader {
    pub magic: u32,
    pub version: u32,
    pub trading_date: u32,
    pub capacity: u32,
    pub size: u32,
    pub record_size: u32,
    pub uncompressed_size: u32,
    pub _reserved: u32,
}

impl BlockHeader {
    pub fn new(version: BlockVersion, trading_date: u32, capacity: u32, record_size: u32) -> Self {
        Self {
            magic: BLOCK_MAGIC,
            version: version as u32,
            trading_date,
            capacity,
            size: 0,
            record_size,
            uncompressed_size: 0,
            _reserved: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == BLOCK_MAGIC && BlockVersion::from_u32(self.version).is_some()
    }
}

/// Stream kind, used only to pick a capacity growth policy: HFT streams
/// (tick/L2) double on overflow; bar streams grow
/// by a session-minute-derived increment since their natural size is
/// already bounded by the session length.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StreamKind {
    Tick,
    OrderQueue,
    OrderDetail,
    Transaction,
    Bar1m,
    Bar5m,
}

impl StreamKind {
    pub fn directory_name(self) -> &'static str {
        match self {
            StreamKind::Tick => "ticks",
            StreamKind::OrderQueue => "ordque",
            StreamKind::OrderDetail => "orddtl",
            StreamKind::Transaction => "trans",
            StreamKind::Bar1m => "min1",
            StreamKind::Bar5m => "min5",
        }
    }

    pub fn next_capacity(self, current: u32, session_minutes: u32) -> u32 {
        match self {
            StreamKind::Tick | StreamKind::OrderQueue | StreamKind::OrderDetail
            | StreamKind::Transaction => current.saturating_mul(2),
            StreamKind::Bar1m => current + session_minutes.max(1),
            StreamKind::Bar5m => current + (session_minutes / 5).max(1),
        }
    }
}
