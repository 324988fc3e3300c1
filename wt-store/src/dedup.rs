use crate::error::StoreError;
use crate::record::TickRecord;
use smol_str::SmolStr;

/// Applies the tick write-path dedup/time-normalization rules in
/// place, deriving `volume`/`turn_over`/`diff_interest` from
/// the cumulative fields and, where the source exchange emits several
/// ticks within the same wall-clock second, nudging `action_time`
/// forward so each stays individually orderable.
///
/// `computed_trading_date` is the trading date the registry's
/// `calc_trading_date` assigns to `(tick.action_date, tick.action_time)`
/// — passed in rather than computed here so this module stays free of a
/// dependency on `wt-instrument`.
pub fn normalize(
    exchange: &SmolStr,
    code: &SmolStr,
    tick: &mut TickRecord,
    cached: Option<&TickRecord>,
    computed_trading_date: u32,
) -> Result<(), StoreError> {
    if computed_trading_date > tick.trading_date {
        return Err(StoreError::StaleTick {
            exchange: exchange.clone(),
            code: code.clone(),
            reason: "computed trading date exceeds carried trading date (session misconfig)",
        });
    }

    let Some(cached) = cached else {
        tick.volume = tick.total_volume;
        tick.turn_over = tick.total_turnover;
        tick.diff_interest = tick.open_interest - tick.pre_interest;
        return Ok(());
    };

    if tick.total_volume < cached.total_volume {
        return Err(StoreError::StaleTick {
            exchange: exchange.clone(),
            code: code.clone(),
            reason: "total_volume went backwards relative to the cached tick",
        });
    }

    if tick.action_date == cached.action_date
        && tick.action_time <= cached.action_time
        && tick.total_volume >= cached.total_volume
    {
        tick.action_time += 200;
    }

    if tick.trading_date > cached.trading_date {
        tick.volume = tick.total_volume;
        tick.turn_over = tick.total_turnover;
        tick.diff_interest = tick.open_interest - tick.pre_interest;
    } else {
        tick.volume = tick.total_volume - cached.total_volume;
        tick.turn_over = tick.total_turnover - cached.total_turnover;
        tick.diff_interest = tick.open_interest - cached.open_interest;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_tick() -> TickRecord {
        TickRecord {
            action_date: 20240102,
            action_time: 91_500_000,
            trading_date: 20240102,
            _pad_header: [0; 4],
            price: 3500.0,
            open: 3490.0,
            high: 3510.0,
            low: 3480.0,
            settle_price: 0.0,
            total_volume: 1000,
            volume: 0,
            total_turnover: 3_500_000.0,
            turn_over: 0.0,
            open_interest: 20000,
            diff_interest: 0,
            pre_close: 3480.0,
            pre_settle: 3480.0,
            pre_interest: 19800,
            upper_limit: 3800.0,
            lower_limit: 3200.0,
            bid_price: [0.0; 5],
            ask_price: [0.0; 5],
            bid_qty: [0; 5],
            ask_qty: [0; 5],
            px_type: crate::record::PX_TYPE_REAL,
            _pad_px_type: [0; 7],
        }
    }

    #[test]
    fn first_tick_of_day_synthesizes_deltas_from_totals() {
        let exchange = SmolStr::new("SHFE");
        let code = SmolStr::new("rb2410");
        let mut tick = base_tick();
        normalize(&exchange, &code, &mut tick, None, 20240102).unwrap();
        assert_eq!(tick.volume, 1000);
        assert_eq!(tick.turn_over, 3_500_000.0);
        assert_eq!(tick.diff_interest, 200);
    }

    #[test]
    fn subsequent_tick_computes_delta_against_cached() {
        let exchange = SmolStr::new("SHFE");
        let code = SmolStr::new("rb2410");
        let cached = base_tick();
        let mut next = base_tick();
        next.action_time = 91_501_000;
        next.total_volume = 1200;
        next.total_turnover = 4_200_000.0;
        next.open_interest = 20050;

        normalize(&exchange, &code, &mut next, Some(&cached), 20240102).unwrap();
        assert_eq!(next.volume, 200);
        assert_eq!(next.turn_over, 700_000.0);
        assert_eq!(next.diff_interest, 50);
    }

    #[test]
    fn rejects_non_monotone_volume() {
        let exchange = SmolStr::new("SHFE");
        let code = SmolStr::new("rb2410");
        let cached = base_tick();
        let mut next = base_tick();
        next.total_volume = 500;

        let err = normalize(&exchange, &code, &mut next, Some(&cached), 20240102).unwrap_err();
        assert!(matches!(err, StoreError::StaleTick { .. }));
    }

    #[test]
    fn same_second_duplicate_bumps_action_time_by_200ms() {
        let exchange = SmolStr::new("SHFE");
        let code = SmolStr::new("rb2410");
        let cached = base_tick();
        let mut next = base_tick();
        next.total_volume = 1300;

        normalize(&exchange, &code, &mut next, Some(&cached), 20240102).unwrap();
        assert_eq!(next.action_time, 91_500_000 + 200);
    }

    #[test]
    fn rejects_when_computed_trading_date_outruns_carried() {
        let exchange = SmolStr::new("SHFE");
        let code = SmolStr::new("rb2410");
        let mut tick = base_tick();
        let err = normalize(&exchange, &code, &mut tick, None, 20240103).unwrap_err();
        assert!(matches!(err, StoreError::StaleTick { .. }));
    }
}
