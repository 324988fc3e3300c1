use serde::{Deserialize, Serialize};
use wt_instrument::contract::CoverMode;

/// Per-contract position reconciliation built from a position-query
/// response: `l_`/`s_` prefixes are long/short, `new`/`pre` are
/// today's/yesterday's lots. `avail` subtracts volume already locked by
/// a pending close order from `vol`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PosItem {
    pub l_newvol: i64,
    pub l_newavail: i64,
    pub l_prevol: i64,
    pub l_preavail: i64,
    pub s_newvol: i64,
    pub s_newavail: i64,
    pub s_prevol: i64,
    pub s_preavail: i64,
}

impl PosItem {
    pub fn long_total(&self) -> i64 {
        self.l_newvol + self.l_prevol
    }

    pub fn short_total(&self) -> i64 {
        self.s_newvol + self.s_prevol
    }

    /// Builds a [`PosItem`] from a broker reply that reports total
    /// volume/available per direction without a reliable PositionDate
    /// split: everything not already known to be today's is attributed
    /// to yesterday.
    pub fn from_totals_minus_today(
        l_total: i64,
        l_avail: i64,
        l_today: i64,
        s_total: i64,
        s_avail: i64,
        s_today: i64,
    ) -> Self {
        Self {
            l_newvol: l_today,
            l_newavail: l_today.min(l_avail),
            l_prevol: l_total - l_today,
            l_preavail: l_avail - l_today.min(l_avail),
            s_newvol: s_today,
            s_newavail: s_today.min(s_avail),
            s_prevol: s_total - s_today,
            s_preavail: s_avail - s_today.min(s_avail),
        }
    }
}

/// Whether `cover_mode` requires today/yesterday lots to be closed with
/// distinct order offsets.
pub fn distinguishes_today(cover_mode: CoverMode) -> bool {
    matches!(cover_mode, CoverMode::CloseToday)
}
