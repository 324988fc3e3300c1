use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{info, warn};
use wt_execution::order::{Direction, OrderFlag};
use wt_execution::TraderAdapter;
use wt_instrument::exchange::{full_code, Code, Exchange};
use wt_instrument::registry::BaseDataRegistry;
use wt_store::record::{TickRecord, PX_TYPE_CLOSE};
use wt_store::store::DataStore;
use wt_strategy::{on_bar, on_schedule, on_tick, ContextState, StrategyConfig, TickOutcome, TradeLog};

use crate::engine::clock::EngineClock;
use crate::engine::error::{EngineError, RecoverableEngineError, UnrecoverableEngineError};
use crate::outputs::OutputWriter;
use crate::statistic::summary::TradingSummary;
use crate::statistic::time::Daily;
use crate::ticker::{SessionTicker, TickerEvent};
use crate::Timed;

/// [`EngineClock`], [`clock::LiveClock`] and [`clock::HistoricalClock`].
pub mod clock;
/// [`EngineError`] and its recoverable/unrecoverable split.
pub mod error;
/// Synchronous run loop driving an [`Engine`] to completion.
pub mod run;

/// Engine bookkeeping that has nothing to do with any one context: when
/// the run started and how many ticks it has dispatched.
#[derive(Debug, Clone, Copy)]
pub struct EngineMeta {
    pub time_start: chrono::DateTime<chrono::Utc>,
    pub sequence: u64,
}

impl EngineMeta {
    fn init(time_start: chrono::DateTime<chrono::Utc>) -> Self {
        Self { time_start, sequence: 0 }
    }
}

/// Per-context state the engine keeps alongside a
/// [`StrategyConfig`]: its book, whether it's tick- or schedule-driven,
/// its running trading-summary generator, and (when the engine has an
/// output directory configured) the CSV/JSON writer for its trade log.
struct ContextEntry {
    config: StrategyConfig,
    state: ContextState,
    schedule_driven: bool,
    summary: crate::statistic::summary::TradingSummaryGenerator,
    output: Option<OutputWriter>,
    /// Monotonic counter standing in for the replay bar index a trade
    /// or close fell on, written to `trades.csv`/`closes.csv`'s
    /// `barno`/`openbarno`/`closebarno` columns.
    bar_no: u64,
}

/// Owns the base-data registry, tick/bar store, every running strategy
/// context, and the session ticker, and dispatches market data to
/// contexts on a single thread. Not
/// generic over a strategy type: [`wt_strategy::on_tick`] and
/// [`wt_strategy::on_schedule`] are free functions taking a context's
/// state and config directly, so dispatch only needs to know which
/// contexts are subscribed to which codes.
pub struct Engine<C: EngineClock> {
    clock: C,
    meta: EngineMeta,
    registry: Arc<BaseDataRegistry>,
    store: Arc<DataStore>,
    trader: Option<TraderAdapter>,
    ticker: SessionTicker,
    contexts: IndexMap<SmolStr, ContextEntry>,
    tick_sub_map: IndexMap<SmolStr, Vec<SmolStr>>,
    bar_sub_map: IndexMap<(SmolStr, u32), Vec<SmolStr>>,
    risk_free_return: f64,
    output_dir: Option<PathBuf>,
}

impl<C: EngineClock> Engine<C> {
    pub fn new(clock: C, registry: Arc<BaseDataRegistry>, store: Arc<DataStore>, trader: Option<TraderAdapter>, risk_free_return: f64) -> Self {
        let time_start = clock.time();
        Self {
            clock,
            meta: EngineMeta::init(time_start),
            registry,
            store,
            trader,
            ticker: SessionTicker::new(),
            contexts: IndexMap::new(),
            tick_sub_map: IndexMap::new(),
            bar_sub_map: IndexMap::new(),
            risk_free_return,
            output_dir: None,
        }
    }

    /// Configures the root directory [`register_context`](Self::register_context)
    /// writes each new context's output files under. Contexts already
    /// registered before this call keep writing nowhere; call this
    /// before registering contexts.
    pub fn set_output_dir(&mut self, dir: PathBuf) {
        self.output_dir = Some(dir);
    }

    pub fn time(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.time()
    }

    pub fn meta(&self) -> EngineMeta {
        self.meta
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Registers a new context, seeding its trading-summary generator
    /// with zero opening equity at the engine's current time. When the
    /// engine has an [`output_dir`](Self::set_output_dir) configured,
    /// opens that context's output files too; a failure to open them is
    /// logged and leaves the context running without output rather than
    /// failing registration.
    pub fn register_context(&mut self, config: StrategyConfig, schedule_driven: bool) {
        let context_id = SmolStr::new(&config.context_id);
        let summary = crate::statistic::summary::TradingSummaryGenerator::init(self.risk_free_return, Timed::new(0.0, self.time()));
        let output = self.output_dir.as_deref().and_then(|dir| match OutputWriter::open(dir, &config.context_id) {
            Ok(writer) => Some(writer),
            Err(err) => {
                warn!(%err, context_id = %config.context_id, "failed to open context output files");
                None
            }
        });
        self.contexts.insert(
            context_id,
            ContextEntry { config, state: ContextState::new(), schedule_driven, summary, output, bar_no: 0 },
        );
    }

    /// Registers `context_id` for every tick on `exchange.code`.
    pub fn subscribe_tick(&mut self, context_id: &str, exchange: &Exchange, code: &Code) {
        self.tick_sub_map
            .entry(full_code(exchange, code))
            .or_default()
            .push(SmolStr::new(context_id));
    }

    /// Registers `context_id` for bar-close events of `period_minutes`
    /// on `exchange.code`.
    pub fn subscribe_bar(&mut self, context_id: &str, exchange: &Exchange, code: &Code, period_minutes: u32) {
        self.bar_sub_map
            .entry((full_code(exchange, code), period_minutes))
            .or_default()
            .push(SmolStr::new(context_id));
    }

    /// Snapshots the running [`TradingSummary`] for one context.
    pub fn summary(&self, context_id: &str) -> Option<TradingSummary<Daily>> {
        self.contexts.get(context_id).map(|entry| entry.summary.generate(Daily))
    }

    pub fn context_state(&self, context_id: &str) -> Option<&ContextState> {
        self.contexts.get(context_id).map(|entry| &entry.state)
    }

    pub fn context_state_mut(&mut self, context_id: &str) -> Option<&mut ContextState> {
        self.contexts.get_mut(context_id).map(|entry| &mut entry.state)
    }

    pub fn registry(&self) -> &Arc<BaseDataRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    /// Dispatches one tick for `exchange.code`: writes it to the store,
    /// runs it through the ticker, and fans out every boundary the tick
    /// just crossed before the tick itself, so a strategy's `on_bar`/
    /// `on_schedule` for a closing minute always runs before its
    /// `on_tick` for the quote that closed it:
    /// 1. [`on_session_begin`](Self::on_session_begin), if this is the
    ///    code's first tick of the trading day;
    /// 2. [`dispatch_bar`](Self::dispatch_bar) for every bar period the
    ///    tick just closed, and [`dispatch_schedule`](Self::dispatch_schedule)
    ///    once per 1-minute boundary crossed;
    /// 3. [`dispatch_tick`](Self::dispatch_tick) to every tick-subscribed
    ///    context;
    /// 4. [`on_session_end`](Self::on_session_end), if the tick closed
    ///    the contract's final section for the day.
    ///
    /// Resulting trades/closes are forwarded to the trader adapter and
    /// appended to each context's output files best-effort.
    pub fn on_tick(&mut self, exchange: &Exchange, code: &Code, tick: TickRecord) -> Result<(), EngineError> {
        self.meta.sequence += 1;

        let contract = self
            .registry
            .contract(exchange, code)
            .map_err(|_| RecoverableEngineError::UnknownContract { exchange: exchange.as_str().into(), code: code.as_str().into() })?
            .clone();

        let prev_price = self.store.last_tick(exchange, code).map(|t| t.price).unwrap_or(tick.price);
        let cur_price = tick.price;
        let enter_time = tick.action_time;
        let bar_closed = tick.px_type == PX_TYPE_CLOSE;

        self.store.on_tick(exchange, code, tick).map_err(UnrecoverableEngineError::Store)?;

        let hhmm = enter_time / 100_000;
        let events = self
            .ticker
            .on_tick(&self.registry, exchange, code, hhmm)
            .map_err(|_| RecoverableEngineError::UnknownContext(code.as_str().to_string()))?;

        let full = full_code(exchange, code);
        let mut session_ended = false;

        for event in &events {
            match *event {
                TickerEvent::SessionBegin => {
                    self.on_session_begin(exchange, code);
                }
                TickerEvent::BarClose { period_minutes, .. } => {
                    self.dispatch_bar(&full, period_minutes, &contract, exchange, code, enter_time)?;
                    if period_minutes == 1 {
                        self.dispatch_schedule(&full, &contract, cur_price, enter_time)?;
                    }
                }
                TickerEvent::SessionEnd => {
                    session_ended = true;
                }
            }
        }

        if let Some(context_ids) = self.tick_sub_map.get(&full).cloned() {
            for context_id in context_ids {
                self.dispatch_tick(&context_id, &contract, &full, prev_price, cur_price, bar_closed, enter_time)?;
            }
        }

        if session_ended {
            self.on_session_end(exchange, code)?;
        }

        Ok(())
    }

    fn dispatch_tick(
        &mut self,
        context_id: &str,
        contract: &wt_instrument::ContractInfo,
        full: &str,
        prev_price: f64,
        cur_price: f64,
        bar_closed: bool,
        enter_time: u32,
    ) -> Result<(), EngineError> {
        let Some(entry) = self.contexts.get_mut(context_id) else {
            warn!(%context_id, "tick routed to an unregistered context");
            return Ok(());
        };
        if entry.schedule_driven {
            return Ok(());
        }

        let outcome = on_tick(
            &mut entry.state,
            &entry.config,
            full,
            prev_price,
            cur_price,
            bar_closed,
            contract.price_tick,
            contract.volume_scale,
            contract.t_plus_1,
            enter_time,
        )
        .map_err(|err| RecoverableEngineError::OrderRejected(err.to_string()))?;

        for close in &outcome.closes {
            entry.summary.record_close(close);
        }
        write_outputs(entry, &outcome);

        self.forward_to_trader(contract, &outcome.trades, &outcome.closes);
        Ok(())
    }

    /// Runs `on_bar` for every context subscribed to `period_minutes`
    /// bars of `full`, feeding each the just-closed [`BarRecord`](wt_store::record::BarRecord)
    /// read back from the store. The store's bar block already reflects
    /// this tick's aggregation by the time the ticker raises the
    /// boundary that triggers this call, so `last_n_bars(.., 2).first()`
    /// is always the bar that just closed (the sole record, if the
    /// boundary forced the session's final bar closed early).
    fn dispatch_bar(
        &mut self,
        full: &str,
        period_minutes: u32,
        contract: &wt_instrument::ContractInfo,
        exchange: &Exchange,
        code: &Code,
        enter_time: u32,
    ) -> Result<(), EngineError> {
        let Some(context_ids) = self.bar_sub_map.get(&(SmolStr::new(full), period_minutes)).cloned() else {
            return Ok(());
        };
        let bars = self.store.last_n_bars(exchange, code, period_minutes, 2).map_err(UnrecoverableEngineError::Store)?;
        let Some(bar) = bars.first().copied() else {
            return Ok(());
        };

        for context_id in context_ids {
            let Some(entry) = self.contexts.get_mut(context_id.as_str()) else {
                continue;
            };
            let outcome = on_bar(
                &mut entry.state,
                &entry.config,
                full,
                bar.close,
                contract.price_tick,
                contract.volume_scale,
                contract.t_plus_1,
                enter_time,
            )
            .map_err(|err| RecoverableEngineError::OrderRejected(err.to_string()))?;

            for close in &outcome.closes {
                entry.summary.record_close(close);
            }
            write_outputs(entry, &outcome);
            self.forward_to_trader(contract, &outcome.trades, &outcome.closes);
        }
        Ok(())
    }

    /// Runs `on_schedule` for every registered context once per
    /// 1-minute boundary crossed, regardless of whether that context
    /// holds a bar subscription: SEL-style contexts rebalance on their
    /// own clock, not on any one code's bar stream. A context with no
    /// pending signal queued for `full` is a no-op.
    fn dispatch_schedule(&mut self, full: &str, contract: &wt_instrument::ContractInfo, price: f64, enter_time: u32) -> Result<(), EngineError> {
        let context_ids: Vec<SmolStr> = self.contexts.keys().cloned().collect();
        for context_id in context_ids {
            let Some(entry) = self.contexts.get_mut(context_id.as_str()) else {
                continue;
            };
            let outcome = on_schedule(
                &mut entry.state,
                &entry.config,
                full,
                price,
                contract.price_tick,
                contract.volume_scale,
                contract.t_plus_1,
                enter_time,
            )
            .map_err(|err| RecoverableEngineError::OrderRejected(err.to_string()))?;

            for close in &outcome.closes {
                entry.summary.record_close(close);
            }
            write_outputs(entry, &outcome);
            self.forward_to_trader(contract, &outcome.trades, &outcome.closes);
        }
        Ok(())
    }

    /// Runs the session-begin reset for one contract: every context's
    /// frozen (T+1, not-yet-closable) volume on this code is zeroed, so
    /// positions opened the previous trading day become freely closable
    /// again.
    fn on_session_begin(&mut self, exchange: &Exchange, code: &Code) {
        let full = full_code(exchange, code);
        for entry in self.contexts.values_mut() {
            if let Some(pos) = entry.state.positions.get_mut(full.as_str()) {
                pos.frozen = 0;
            }
        }
    }

    /// Forwards a quote's opening/closing trades to the trader adapter,
    /// best-effort: a rejected or errored order is logged and otherwise
    /// ignored. The engine's own accounting ([`wt_strategy::do_set_position`])
    /// already books the fill immediately for both backtest and live
    /// runs, so a trader-adapter failure here does not roll back the
    /// context's book — live execution quality is the adapter's concern,
    /// not the strategy layer's.
    fn forward_to_trader(&mut self, contract: &wt_instrument::ContractInfo, trades: &[wt_strategy::TradeLog], closes: &[wt_strategy::CloseLog]) {
        let Some(trader) = self.trader.as_mut() else {
            return;
        };
        let now = self.clock.time();

        for trade in trades {
            let result = match trade.direction {
                Direction::Long => trader.buy(
                    now,
                    contract.exchange.clone(),
                    contract.code.clone(),
                    &contract.product,
                    false,
                    trade.price,
                    trade.volume,
                    OrderFlag::Nor,
                    contract.cover_mode,
                    trade.user_tag.as_str(),
                ),
                Direction::Short => trader.sell(
                    now,
                    contract.exchange.clone(),
                    contract.code.clone(),
                    &contract.product,
                    false,
                    trade.price,
                    trade.volume,
                    OrderFlag::Nor,
                    contract.cover_mode,
                    trade.user_tag.as_str(),
                ),
            };
            if let Err(err) = result {
                warn!(%err, code = %contract.code, "trader adapter rejected opening order");
            }
        }

        for close in closes {
            // Closing a long detail is a sell; closing a short detail is a buy.
            let result = match close.direction {
                Direction::Long => trader.sell(
                    now,
                    contract.exchange.clone(),
                    contract.code.clone(),
                    &contract.product,
                    true,
                    close.close_price,
                    close.volume,
                    OrderFlag::Nor,
                    contract.cover_mode,
                    "",
                ),
                Direction::Short => trader.buy(
                    now,
                    contract.exchange.clone(),
                    contract.code.clone(),
                    &contract.product,
                    true,
                    close.close_price,
                    close.volume,
                    OrderFlag::Nor,
                    contract.cover_mode,
                    "",
                ),
            };
            if let Err(err) = result {
                warn!(%err, code = %contract.code, "trader adapter rejected closing order");
            }
        }
    }

    /// Dumps every context's end-of-run state (`{context_id}.json`) and
    /// user-data (`ud_{context_id}.json`) to its output files,
    /// best-effort. Called once after [`run::run`] returns, not on every
    /// session close, since the position/fund/signal snapshot it writes
    /// is only meaningful once no more ticks are coming.
    pub fn finalize(&self) {
        for entry in self.contexts.values() {
            let Some(output) = entry.output.as_ref() else {
                continue;
            };
            let summary = entry.summary.generate(Daily);
            let state = serde_json::json!({
                "positions": entry.state.positions,
                "fund": entry.state.fund,
                "pending_signals": entry.state.pending_signals,
                "conditional_orders": entry.state.conditional_orders,
                "multi_level_exits": entry.state.multi_level_exits,
            });
            if let Err(err) = output.write_state(&summary, &state) {
                warn!(%err, context_id = %entry.config.context_id, "failed to write end-of-run state");
            }
            let user_data: std::collections::HashMap<String, String> =
                entry.state.user_data.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
            if let Err(err) = output.write_user_data(&user_data) {
                warn!(%err, context_id = %entry.config.context_id, "failed to write user data");
            }
        }
    }

    /// Runs the session-close rollover for one contract: flushes the
    /// store, resets the ticker's per-code minute index, and
    /// feeds every context's dynamic balance into its trading-summary
    /// generator for the day that just ended. Also appends each
    /// context's fund/position rows for the day to its output files.
    fn on_session_end(&mut self, exchange: &Exchange, code: &Code) -> Result<(), EngineError> {
        self.store.on_session_close(exchange, code).map_err(UnrecoverableEngineError::Store)?;
        self.ticker.reset(exchange, code);

        let now = self.time();
        let trading_date = self.clock.time().format("%Y%m%d").to_string().parse::<u32>().unwrap_or(0);
        let full = full_code(exchange, code);
        for entry in self.contexts.values_mut() {
            let dyn_balance = entry.state.fund.total_profit - entry.state.fund.total_fees;
            entry.summary.record_equity(Timed::new(dyn_balance, now));

            if let Some(output) = entry.output.as_ref() {
                let position_profit: f64 = entry.state.positions.values().map(|pos| pos.dyn_profit()).sum();
                if let Err(err) =
                    output.append_fund(trading_date, entry.state.fund.total_closed_profit, position_profit, dyn_balance, entry.state.fund.total_fees)
                {
                    warn!(%err, "failed to append fund row");
                }
                if let Some(pos) = entry.state.positions.get(full.as_str()) {
                    if let Err(err) = output.append_position(trading_date, full.as_str(), pos.volume(), pos.closed_profit(), pos.dyn_profit()) {
                        warn!(%err, "failed to append position row");
                    }
                }
            }
        }

        info!(exchange = %exchange, code = %code, "session closed");
        Ok(())
    }
}

/// Appends every trade/close an [`on_tick`]/[`on_bar`]/[`on_schedule`]
/// outcome produced to `entry`'s output files, best-effort: the
/// synthesized closing leg gets its own trade row (`action: "CLOSE"`)
/// alongside the opening one, matching the original backtester's
/// ledger where every fill, not just opens, lands in `trades.csv`.
fn write_outputs(entry: &mut ContextEntry, outcome: &TickOutcome) {
    let Some(output) = entry.output.as_ref() else {
        return;
    };

    for trade in &outcome.trades {
        entry.bar_no += 1;
        if let Err(err) = output.append_trade(trade, "OPEN", entry.bar_no) {
            warn!(%err, "failed to append trade row");
        }
    }

    for close in &outcome.closes {
        let open_barno = entry.bar_no;
        entry.bar_no += 1;
        let closing_trade = TradeLog {
            code: close.code.clone(),
            direction: close.direction,
            price: close.close_price,
            volume: close.volume,
            fee: close.fee,
            user_tag: close.exit_tag.clone(),
            enter_time: close.close_time,
        };
        if let Err(err) = output.append_trade(&closing_trade, "CLOSE", entry.bar_no) {
            warn!(%err, "failed to append trade row");
        }
        if let Err(err) = output.append_close(close, open_barno, entry.bar_no) {
            warn!(%err, "failed to append close row");
        }
    }
}

impl<C: EngineClock> std::fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("time_start", &self.meta.time_start)
            .field("sequence", &self.meta.sequence)
            .field("contexts", &self.contexts.len())
            .finish_non_exhaustive()
    }
}
