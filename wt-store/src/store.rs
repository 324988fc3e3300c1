use parking_lot::{Mutex, RwLock};
use smol_str::SmolStr;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;
use tracing::warn;
use wt_instrument::exchange::{Code, Exchange, full_code};
use wt_instrument::registry::BaseDataRegistry;

use crate::bar_agg::{self, BarUpdate};
use crate::block::StreamKind;
use crate::config::StoreConfig;
use crate::dedup;
use crate::error::StoreError;
use crate::his;
use crate::lmdb::LmdbStore;
use crate::marker::MarkerFile;
use crate::record::{BarRecord, TickRecord};
use crate::rt::RtBlock;

type TickBlocks = RwLock<indexmap::IndexMap<SmolStr, Arc<RtBlock<TickRecord>>>>;
type BarBlocks = RwLock<indexmap::IndexMap<SmolStr, Arc<RtBlock<BarRecord>>>>;

struct Inner {
    config: StoreConfig,
    registry: Arc<BaseDataRegistry>,
    ticks: TickBlocks,
    bar1m: BarBlocks,
    bar5m: BarBlocks,
    last_tick: RwLock<indexmap::IndexMap<SmolStr, TickRecord>>,
    marker: Mutex<MarkerFile>,
    lmdb: Option<LmdbStore>,
}

enum Task {
    Tick {
        exchange: Exchange,
        code: Code,
        tick: TickRecord,
    },
    SessionClose {
        exchange: Exchange,
        code: Code,
    },
}

/// Top-level columnar store: ties the RT ring-block layer, the HIS
/// compressed archive layer and the optional LMDB variant together
/// behind a single write path that applies dedup and bar aggregation on
/// every accepted tick.
///
/// When `config.async_proc` is set, [`DataStore::on_tick`] hands the
/// write off to a background worker thread instead of running inline,
/// FIFO because it drains a single `mpsc` channel.
pub struct DataStore {
    inner: Arc<Inner>,
    worker: Option<(mpsc::Sender<Task>, JoinHandle<()>)>,
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("async_proc", &self.inner.config.async_proc)
            .finish_non_exhaustive()
    }
}

impl DataStore {
    pub fn open(config: StoreConfig, registry: Arc<BaseDataRegistry>) -> Result<Self, StoreError> {
        let marker = MarkerFile::load(&config.marker_path())?;
        let lmdb = if config.layers.lmdb {
            Some(LmdbStore::open(&config.lmdb_dir(), 1 << 30)?)
        } else {
            None
        };

        let inner = Arc::new(Inner {
            ticks: RwLock::new(indexmap::IndexMap::new()),
            bar1m: RwLock::new(indexmap::IndexMap::new()),
            bar5m: RwLock::new(indexmap::IndexMap::new()),
            last_tick: RwLock::new(indexmap::IndexMap::new()),
            marker: Mutex::new(marker),
            lmdb,
            registry,
            config,
        });

        let worker = if inner.config.async_proc {
            let (tx, rx) = mpsc::channel::<Task>();
            let worker_inner = Arc::clone(&inner);
            let handle = std::thread::Builder::new()
                .name("wt-store-async".into())
                .spawn(move || {
                    for task in rx {
                        if let Err(err) = run_task(&worker_inner, task) {
                            warn!(%err, "store async task failed");
                        }
                    }
                })
                .expect("spawn store async-task thread");
            Some((tx, handle))
        } else {
            None
        };

        Ok(Self { inner, worker })
    }

    /// Accepts one tick: dedups/normalizes it, writes it to the tick RT
    /// block, folds it into the running 1m/5m bars, and (if enabled)
    /// mirrors it into the LMDB variant.
    pub fn on_tick(&self, exchange: &Exchange, code: &Code, tick: TickRecord) -> Result<(), StoreError> {
        if let Some((tx, _)) = &self.worker {
            tx.send(Task::Tick {
                exchange: exchange.clone(),
                code: code.clone(),
                tick,
            })
            .ok();
            return Ok(());
        }
        self.inner.write_tick(exchange, code, tick)
    }

    /// Runs session-close rollover for one contract: moves today's RT
    /// tick block into the HIS archive, zeroes the RT block, and
    /// records the rollover in `marker.ini`.
    pub fn on_session_close(&self, exchange: &Exchange, code: &Code) -> Result<(), StoreError> {
        if let Some((tx, _)) = &self.worker {
            tx.send(Task::SessionClose {
                exchange: exchange.clone(),
                code: code.clone(),
            })
            .ok();
            return Ok(());
        }
        self.inner.session_close(exchange, code)
    }

    pub fn last_n_bars(
        &self,
        exchange: &Exchange,
        code: &Code,
        period_minutes: u32,
        n: usize,
    ) -> Result<Vec<BarRecord>, StoreError> {
        self.inner.last_n_bars(exchange, code, period_minutes, n)
    }

    pub fn last_tick(&self, exchange: &Exchange, code: &Code) -> Option<TickRecord> {
        let key = full_code(exchange, code);
        self.inner.last_tick.read().get(&key).copied()
    }
}

impl Drop for DataStore {
    fn drop(&mut self) {
        if let Some((tx, handle)) = self.worker.take() {
            drop(tx);
            let _ = handle.join();
        }
    }
}

fn run_task(inner: &Arc<Inner>, task: Task) -> Result<(), StoreError> {
    match task {
        Task::Tick { exchange, code, tick } => inner.write_tick(&exchange, &code, tick),
        Task::SessionClose { exchange, code } => inner.session_close(&exchange, &code),
    }
}

impl Inner {
    fn tick_block(&self, exchange: &Exchange, code: &Code, trading_date: u32) -> Result<Arc<RtBlock<TickRecord>>, StoreError> {
        let key = full_code(exchange, code);
        if let Some(block) = self.ticks.read().get(&key) {
            return Ok(Arc::clone(block));
        }
        let mut guard = self.ticks.write();
        if let Some(block) = guard.get(&key) {
            return Ok(Arc::clone(block));
        }
        let path = self
            .config
            .rt_dir()
            .join(StreamKind::Tick.directory_name())
            .join(exchange.as_str())
            .join(format!("{}.dmb", code.as_str()));
        let block = Arc::new(RtBlock::open_or_create(
            path,
            exchange.0.clone(),
            code.0.clone(),
            StreamKind::Tick,
            self.config.capacities.tick,
            trading_date,
        )?);
        guard.insert(key, Arc::clone(&block));
        Ok(block)
    }

    fn bar_block(
        &self,
        blocks: &BarBlocks,
        kind: StreamKind,
        capacity_override: Option<u32>,
        exchange: &Exchange,
        code: &Code,
        trading_date: u32,
    ) -> Result<Arc<RtBlock<BarRecord>>, StoreError> {
        let key = full_code(exchange, code);
        if let Some(block) = blocks.read().get(&key) {
            return Ok(Arc::clone(block));
        }
        let mut guard = blocks.write();
        if let Some(block) = guard.get(&key) {
            return Ok(Arc::clone(block));
        }
        let session = self
            .registry
            .contract(exchange, code)
            .and_then(|c| self.registry.session_of(c))
            .map_err(|_| StoreError::ContractNotFound {
                exchange: exchange.0.clone(),
                code: code.0.clone(),
            })?;
        let default_capacity = match kind {
            StreamKind::Bar1m => session.trading_mins(),
            StreamKind::Bar5m => (session.trading_mins() / 5).max(1),
            _ => unreachable!("bar_block only handles bar streams"),
        };
        let path = self
            .config
            .rt_dir()
            .join(kind.directory_name())
            .join(exchange.as_str())
            .join(format!("{}.dmb", code.as_str()));
        let block = Arc::new(RtBlock::open_or_create(
            path,
            exchange.0.clone(),
            code.0.clone(),
            kind,
            capacity_override.unwrap_or(default_capacity),
            trading_date,
        )?);
        guard.insert(key, Arc::clone(&block));
        Ok(block)
    }

    fn write_tick(&self, exchange: &Exchange, code: &Code, mut tick: TickRecord) -> Result<(), StoreError> {
        let contract = self
            .registry
            .contract(exchange, code)
            .map_err(|_| StoreError::ContractNotFound {
                exchange: exchange.0.clone(),
                code: code.0.clone(),
            })?;
        let session = self.registry.session_of(contract).map_err(|_| StoreError::ContractNotFound {
            exchange: exchange.0.clone(),
            code: code.0.clone(),
        })?;

        let computed_tdate = self
            .registry
            .calc_trading_date(contract, tick.action_date, tick.action_time / 100_000)
            .map_err(|_| StoreError::ContractNotFound {
                exchange: exchange.0.clone(),
                code: code.0.clone(),
            })?;

        let key = full_code(exchange, code);
        let cached = self.last_tick.read().get(&key).copied();
        dedup::normalize(&exchange.0, &code.0, &mut tick, cached.as_ref(), computed_tdate)?;

        let tick_block = self.tick_block(exchange, code, tick.trading_date)?;
        if tick_block.trading_date() != tick.trading_date {
            warn!(
                exchange = %exchange, code = %code,
                "tick trading date advanced past RT block's without an explicit session close"
            );
        }
        tick_block.push(tick, 0)?;
        self.last_tick.write().insert(key, tick);

        if let Some(lmdb) = &self.lmdb {
            lmdb.put_tick(exchange.as_str(), code.as_str(), tick.trading_date, tick.action_time, &tick)?;
        }

        self.fold_bar(&self.bar1m, StreamKind::Bar1m, session.trading_mins(), exchange, code, &tick)?;
        self.fold_bar(
            &self.bar5m,
            StreamKind::Bar5m,
            (session.trading_mins() / 5).max(1),
            exchange,
            code,
            &tick,
        )?;

        Ok(())
    }

    fn fold_bar(
        &self,
        blocks: &BarBlocks,
        kind: StreamKind,
        session_minutes: u32,
        exchange: &Exchange,
        code: &Code,
        tick: &TickRecord,
    ) -> Result<(), StoreError> {
        let contract = self.registry.contract(exchange, code).map_err(|_| StoreError::ContractNotFound {
            exchange: exchange.0.clone(),
            code: code.0.clone(),
        })?;
        let session = self.registry.session_of(contract).map_err(|_| StoreError::ContractNotFound {
            exchange: exchange.0.clone(),
            code: code.0.clone(),
        })?;

        let block = self.bar_block(blocks, kind, None, exchange, code, tick.trading_date)?;
        let last = block.last();
        let update = bar_agg::aggregate(
            session,
            tick,
            last,
            self.config.skip_notrade_tick,
            self.config.skip_notrade_bar,
        );
        match update {
            Some(BarUpdate::New(bar)) => block.push(bar, session_minutes)?,
            Some(BarUpdate::Accumulate(bar)) => block.replace_last(bar)?,
            Some(BarUpdate::Skip) | None => {}
        }
        if let Some(lmdb) = &self.lmdb {
            if let Some(BarUpdate::New(bar) | BarUpdate::Accumulate(bar)) = update {
                lmdb.put_bar(exchange.as_str(), code.as_str(), &bar)?;
            }
        }
        Ok(())
    }

    fn last_n_bars(
        &self,
        exchange: &Exchange,
        code: &Code,
        period_minutes: u32,
        n: usize,
    ) -> Result<Vec<BarRecord>, StoreError> {
        let kind = match period_minutes {
            1 => StreamKind::Bar1m,
            5 => StreamKind::Bar5m,
            other => {
                return Err(StoreError::Corruption {
                    exchange: exchange.0.clone(),
                    code: code.0.clone(),
                    stream: "bar",
                    reason: format!("unsupported bar period {other}m"),
                });
            }
        };
        let blocks = match kind {
            StreamKind::Bar1m => &self.bar1m,
            StreamKind::Bar5m => &self.bar5m,
            _ => unreachable!(),
        };

        let mut tail = {
            let key = full_code(exchange, code);
            match blocks.read().get(&key) {
                Some(block) => block.snapshot(),
                None => Vec::new(),
            }
        };

        if tail.len() < n {
            let archive_path = his::archive_path(&self.config.his_dir(), kind, &exchange.0, &code.0, None);
            if archive_path.exists() {
                let mut archived: Vec<BarRecord> = his::read_archive(&archive_path)?;
                archived.extend(tail);
                tail = archived;
            }
        }

        let start = tail.len().saturating_sub(n);
        Ok(tail[start..].to_vec())
    }

    fn session_close(&self, exchange: &Exchange, code: &Code) -> Result<(), StoreError> {
        let contract = self.registry.contract(exchange, code).map_err(|_| StoreError::ContractNotFound {
            exchange: exchange.0.clone(),
            code: code.0.clone(),
        })?;
        let session_id = contract.session_id.clone();

        let key = full_code(exchange, code);
        let closing_tdate = self
            .ticks
            .read()
            .get(&key)
            .map(|b| b.trading_date())
            .unwrap_or(0);

        {
            let marker = self.marker.lock();
            if marker.is_session_proceeded(&session_id, closing_tdate) {
                return Ok(());
            }
        }

        if let Some(block) = self.ticks.read().get(&key).cloned() {
            let records = block.snapshot();
            if !records.is_empty() {
                let path = his::archive_path(
                    &self.config.his_dir(),
                    StreamKind::Tick,
                    &exchange.0,
                    &code.0,
                    Some(closing_tdate),
                );
                his::write_new_archive(&path, &records)?;
            }
            let next_tdate = self.registry.next_trading_date(contract, closing_tdate).unwrap_or(closing_tdate + 1);
            block.reset(next_tdate);
        }

        for (blocks, kind) in [(&self.bar1m, StreamKind::Bar1m), (&self.bar5m, StreamKind::Bar5m)] {
            if let Some(block) = blocks.read().get(&key).cloned() {
                let records = block.snapshot();
                if !records.is_empty() {
                    let path = his::archive_path(&self.config.his_dir(), kind, &exchange.0, &code.0, None);
                    his::append_bar_archive(&path, &records)?;
                }
                let next_tdate = self.registry.next_trading_date(contract, closing_tdate).unwrap_or(closing_tdate + 1);
                block.reset(next_tdate);
            }
        }

        self.marker.lock().mark_processed(session_id, closing_tdate);
        self.marker.lock().save(&self.config.marker_path())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_instrument::{ContractInfo, CoverMode, HolidayTemplate, SessionInfo, SessionSection};

    fn registry() -> Arc<BaseDataRegistry> {
        let mut reg = BaseDataRegistry::new();
        reg.holidays.insert_template("CN", HolidayTemplate::default());
        reg.insert_session(SessionInfo::new(
            "FUT",
            "Day",
            vec![SessionSection {
                open_offset: 540,
                close_offset: 900,
            }],
        ));
        reg.insert_contract(ContractInfo {
            exchange: Exchange::new("SHFE"),
            code: Code::new("rb2410"),
            product: "rb".into(),
            price_tick: 1.0,
            volume_scale: 10.0,
            margin_rate: 0.1,
            fee_rate: 0.0,
            session_id: "FUT".into(),
            cover_mode: CoverMode::CoverAny,
            t_plus_1: false,
            can_short: true,
            holiday_template: "CN".into(),
        });
        Arc::new(reg)
    }

    fn tick(action_time: u32, price: f64, total_volume: i64) -> TickRecord {
        TickRecord {
            action_date: 20240102,
            action_time,
            trading_date: 20240102,
            _pad_header: [0; 4],
            price,
            open: price,
            high: price,
            low: price,
            settle_price: 0.0,
            total_volume,
            volume: 0,
            total_turnover: price * total_volume as f64,
            turn_over: 0.0,
            open_interest: 1000,
            diff_interest: 0,
            pre_close: price,
            pre_settle: price,
            pre_interest: 1000,
            upper_limit: 0.0,
            lower_limit: 0.0,
            bid_price: [price - 1.0; 5],
            ask_price: [price + 1.0; 5],
            bid_qty: [1; 5],
            ask_qty: [1; 5],
            px_type: crate::record::PX_TYPE_REAL,
            _pad_px_type: [0; 7],
        }
    }

    #[test]
    fn on_tick_writes_tick_block_and_folds_bars() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            base_dir: dir.path().to_path_buf(),
            capacities: Default::default(),
            layers: Default::default(),
            skip_notrade_tick: false,
            skip_notrade_bar: false,
            async_proc: false,
        };
        let store = DataStore::open(config, registry()).unwrap();
        let exchange = Exchange::new("SHFE");
        let code = Code::new("rb2410");

        store.on_tick(&exchange, &code, tick(90_030_000, 3500.0, 5)).unwrap();
        store.on_tick(&exchange, &code, tick(90_045_000, 3502.0, 8)).unwrap();

        let bars = store.last_n_bars(&exchange, &code, 1, 10).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 3502.0);

        let last = store.last_tick(&exchange, &code).unwrap();
        assert_eq!(last.price, 3502.0);
    }

    #[test]
    fn session_close_archives_and_resets_tick_block() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            base_dir: dir.path().to_path_buf(),
            capacities: Default::default(),
            layers: Default::default(),
            skip_notrade_tick: false,
            skip_notrade_bar: false,
            async_proc: false,
        };
        let store = DataStore::open(config, registry()).unwrap();
        let exchange = Exchange::new("SHFE");
        let code = Code::new("rb2410");
        store.on_tick(&exchange, &code, tick(90_030_000, 3500.0, 5)).unwrap();

        store.on_session_close(&exchange, &code).unwrap();

        // Running it again for the same trading date is a no-op (idempotency record).
        store.on_session_close(&exchange, &code).unwrap();
    }
}
