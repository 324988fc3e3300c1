use crate::record::{BarRecord, TickRecord};
use wt_instrument::session::SessionInfo;

/// Outcome of folding one tick into the running 1m/5m bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarUpdate {
    /// The tick opens a new bar; the store should append this record.
    New(BarRecord),
    /// The tick belongs to the bar already open; the store should
    /// overwrite its last record with this one.
    Accumulate(BarRecord),
    /// Policy says to ignore this tick for bar purposes entirely
    /// (`skip_notrade_tick`/`skip_notrade_bar`, both independent).
    Skip,
}

/// The session-minute close time for the bar that `hhmm` falls into,
/// paired with whether the close time rolled onto the next calendar day
/// (a night-session bar closing after midnight).
fn bar_close_time(session: &SessionInfo, hhmm: u32) -> Option<(u32, bool)> {
    let minutes = session.time_to_minutes(hhmm)?;
    let close = session.minute_to_time(minutes + 1)?;
    let rolled_over = close < hhmm;
    Some((close, rolled_over))
}

/// `action_time` is encoded `HHMMSSmmm` (eg/ 09:00:30.000 -> 90030000);
/// this drops seconds and milliseconds to the `HHMM` the session algebra
/// operates on.
fn action_time_to_hhmm(action_time: u32) -> u32 {
    action_time / 100_000
}

/// Folds `tick` into the bar stream, given the last bar already written
/// (`None` if the stream is empty for this trading date).
///
/// `tick.volume`/`tick.turn_over` must already hold the per-tick deltas
/// ([`crate::dedup::normalize`] fills these in before a tick reaches
/// aggregation).
pub fn aggregate(
    session: &SessionInfo,
    tick: &TickRecord,
    last: Option<BarRecord>,
    skip_notrade_tick: bool,
    skip_notrade_bar: bool,
) -> Option<BarUpdate> {
    let (close_hhmm, rolled_over) = bar_close_time(session, action_time_to_hhmm(tick.action_time))?;
    let close_date = if rolled_over {
        next_calendar_date(tick.action_date)
    } else {
        tick.action_date
    };

    let no_trade = tick.volume == 0;

    match last {
        Some(bar) if bar.date == close_date && bar.time == close_hhmm => {
            if no_trade && skip_notrade_tick {
                return Some(BarUpdate::Skip);
            }
            let mut updated = bar;
            updated.close = tick.price;
            if updated.high == 0.0 || tick.price > updated.high {
                updated.high = tick.price;
            }
            if updated.low == 0.0 || tick.price < updated.low {
                updated.low = tick.price;
            }
            updated.vol += tick.volume;
            updated.money += tick.turn_over;
            updated.hold = tick.open_interest;
            updated.add += tick.diff_interest;
            updated.bid = tick.bid_price[0];
            updated.ask = tick.ask_price[0];
            Some(BarUpdate::Accumulate(updated))
        }
        _ => {
            if no_trade && (skip_notrade_tick || skip_notrade_bar) {
                return Some(BarUpdate::Skip);
            }
            Some(BarUpdate::New(BarRecord {
                date: close_date,
                time: close_hhmm,
                open: tick.price,
                high: tick.price,
                low: tick.price,
                close: tick.price,
                settle: 0.0,
                vol: tick.volume,
                money: tick.turn_over,
                hold: tick.open_interest,
                add: tick.diff_interest,
                bid: tick.bid_price[0],
                ask: tick.ask_price[0],
            }))
        }
    }
}

fn next_calendar_date(ymd: u32) -> u32 {
    use chrono::{Datelike, Duration, NaiveDate};
    let year = (ymd / 1_0000) as i32;
    let month = (ymd / 100 % 100) as u32;
    let day = (ymd % 100) as u32;
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date");
    let next = date + Duration::days(1);
    (next.year() as u32) * 10000 + next.month() * 100 + next.day()
}
