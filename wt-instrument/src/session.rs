use crate::HhMm;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One `[open, close]` trading section of a [`SessionInfo`], expressed as
/// minutes-from-midnight offsets of the *session's* trading day.
///
/// `close_offset` may exceed `1440` for a section that crosses midnight
/// (eg/ a night session opening 21:00 and closing 02:30 the next
/// calendar day is `{ open_offset: 1260, close_offset: 1590 }`), which is
/// how this model keeps every section's minutes contiguous and strictly
/// increasing without ever needing to special-case wraparound in the
/// minute-index algebra below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionSection {
    pub open_offset: u32,
    pub close_offset: u32,
}

impl SessionSection {
    pub fn duration_mins(&self) -> u32 {
        self.close_offset - self.open_offset
    }

    /// True if this section crosses local midnight.
    pub fn crosses_midnight(&self) -> bool {
        self.close_offset > 1440
    }
}

fn hhmm_to_raw_minutes(hhmm: HhMm) -> u32 {
    (hhmm / 100) * 60 + (hhmm % 100)
}

fn raw_minutes_to_hhmm(mut raw: u32) -> HhMm {
    raw %= 1440;
    (raw / 60) * 100 + (raw % 60)
}

/// A trading schedule attached to a commodity: an ordered list of
/// `[open, close]` sections defining a single trading day.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionInfo {
    pub id: SmolStr,
    pub name: SmolStr,
    pub sections: Vec<SessionSection>,
}

impl SessionInfo {
    pub fn new(id: impl Into<SmolStr>, name: impl Into<SmolStr>, sections: Vec<SessionSection>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sections,
        }
    }

    /// Total number of trading minutes in the session, used to size 1m
    /// bar ring blocks and to know when the last bar has been emitted.
    pub fn trading_mins(&self) -> u32 {
        self.sections.iter().map(SessionSection::duration_mins).sum()
    }

    /// Continuous minutes-since-session-open value for `hhmm`, adjusting
    /// by a full day when `hhmm` is the post-midnight continuation of a
    /// section that opened the previous calendar day. Returns `None` if
    /// `hhmm` does not fall inside any section (market closed).
    fn locate(&self, hhmm: HhMm) -> Option<(usize, u32)> {
        let raw = hhmm_to_raw_minutes(hhmm);
        for (idx, section) in self.sections.iter().enumerate() {
            let open_raw = section.open_offset % 1440;
            let mut candidate = raw;
            if candidate < open_raw {
                candidate += 1440;
            }
            if candidate >= section.open_offset && candidate < section.close_offset {
                return Some((idx, candidate));
            }
        }
        None
    }

    /// Maps a wall-clock `HHMM` to its session-minute index (0-based,
    /// counting from the first section's open). This is the core
    /// primitive used by the ticker and the tick→bar aggregator.
    pub fn time_to_minutes(&self, hhmm: HhMm) -> Option<u32> {
        let (section_idx, candidate) = self.locate(hhmm)?;
        let cum: u32 = self.sections[..section_idx]
            .iter()
            .map(SessionSection::duration_mins)
            .sum();
        Some(cum + (candidate - self.sections[section_idx].open_offset))
    }

    /// Inverse of [`Self::time_to_minutes`]: the wall-clock `HHMM` that
    /// begins session-minute `idx`. `idx == trading_mins()` is valid and
    /// returns the close time of the final section (used for
    /// `minuteToTime(minutes + 1)` bar-close-time computation).
    pub fn minute_to_time(&self, idx: u32) -> Option<HhMm> {
        let mut remaining = idx;
        for section in &self.sections {
            let dur = section.duration_mins();
            if remaining <= dur {
                return Some(raw_minutes_to_hhmm(section.open_offset + remaining));
            }
            remaining -= dur;
        }
        None
    }

    /// True if `hhmm` is the last minute of whichever section it falls
    /// in. Ticks at this instant are attributed to the just-closing bar,
    /// not the next.
    pub fn is_last_of_section(&self, hhmm: HhMm) -> bool {
        match self.locate(hhmm) {
            Some((idx, candidate)) => candidate + 1 == self.sections[idx].close_offset,
            None => false,
        }
    }

    /// True if `section.crosses_midnight()` is true for whichever
    /// section contains this session-minute index.
    pub fn section_crosses_midnight_at(&self, idx: u32) -> bool {
        let mut remaining = idx;
        for section in &self.sections {
            let dur = section.duration_mins();
            if remaining <= dur {
                return section.crosses_midnight();
            }
            remaining -= dur;
        }
        false
    }

    /// Normalizes `hhmm` onto a continuous same-session-day minute axis
    /// (ie/ adds 1440 when `hhmm` is the post-midnight continuation of a
    /// night section). Used by [`crate::registry::BaseDataRegistry::calc_trading_date`].
    pub fn offset_time(&self, hhmm: HhMm) -> Option<u32> {
        self.locate(hhmm).map(|(_, candidate)| candidate)
    }

    /// True if `hhmm` belongs to the pre-midnight (evening) part of a
    /// section that crosses midnight.
    pub fn is_premidnight_night_section(&self, hhmm: HhMm) -> bool {
        match self.locate(hhmm) {
            Some((idx, candidate)) => {
                let section = &self.sections[idx];
                section.crosses_midnight() && candidate < 1440
            }
            None => false,
        }
    }

    /// True if `hhmm` belongs to the post-midnight part of a section
    /// that crosses midnight (ie/ the calendar date has already rolled
    /// to the next day, but the trading date is still the evening's).
    pub fn is_postmidnight_night_section(&self, hhmm: HhMm) -> bool {
        match self.locate(hhmm) {
            Some((idx, candidate)) => {
                let section = &self.sections[idx];
                section.crosses_midnight() && candidate >= 1440
            }
            None => false,
        }
    }

    /// The close offset of the final section, used by the ticker to
    /// detect "end of trading date".
    pub fn close_offset(&self) -> Option<u32> {
        self.sections.last().map(|s| s.close_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn night_day_session() -> SessionInfo {
        // Night session 21:00 -> 02:30 (crosses midnight), day session 09:00 -> 15:00.
        SessionInfo::new(
            "FUT",
            "Futures Standard",
            vec![
                SessionSection { open_offset: 1260, close_offset: 1590 }, // 21:00 - 02:30(+1d)
                SessionSection { open_offset: 540, close_offset: 900 },   // 09:00 - 15:00
            ],
        )
    }

    #[test]
    fn trading_mins_sums_sections() {
        let s = night_day_session();
        assert_eq!(s.trading_mins(), 330 + 360);
    }

    #[test]
    fn time_to_minutes_premidnight() {
        let s = night_day_session();
        assert_eq!(s.time_to_minutes(2100), Some(0));
        assert_eq!(s.time_to_minutes(2300), Some(120));
    }

    #[test]
    fn time_to_minutes_postmidnight_continues_same_section() {
        let s = night_day_session();
        // 00:30 is 210 minutes after 21:00 (180 + 30).
        assert_eq!(s.time_to_minutes(30), Some(210));
        assert!(s.is_postmidnight_night_section(30));
        assert!(!s.is_premidnight_night_section(30));
    }

    #[test]
    fn minute_to_time_inverts_time_to_minutes() {
        let s = night_day_session();
        for hhmm in [2100, 2359, 30, 200, 540, 1459] {
            if let Some(idx) = s.time_to_minutes(hhmm) {
                assert_eq!(s.minute_to_time(idx), Some(hhmm));
            }
        }
    }

    #[test]
    fn is_last_of_section_boundary() {
        let s = night_day_session();
        assert!(s.is_last_of_section(229)); // 02:29, last minute before 02:30 close
        assert!(!s.is_last_of_section(228));
        assert!(s.is_last_of_section(1459)); // 14:59
    }

    #[test]
    fn closed_outside_any_section() {
        let s = night_day_session();
        assert_eq!(s.time_to_minutes(1600), None);
    }
}
