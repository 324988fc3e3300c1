use std::sync::Arc;

use chrono::{TimeZone, Utc};
use wt_execution::TraderAdapter;
use wt_instrument::exchange::{Code, Exchange};
use wt_instrument::holiday::HolidayTemplate;
use wt_instrument::registry::BaseDataRegistry;
use wt_store::store::DataStore;

use crate::engine::clock::{EngineClock, HistoricalClock, LiveClock};
use crate::engine::Engine;
use crate::error::{Result, WtError};
use crate::system::config::{BaseDataSeed, RunMode, SystemConfig};
use crate::system::System;

/// Assembles an [`Engine`] from a [`SystemConfig`]: builds the base-data
/// registry and store, picks a [`LiveClock`] or [`HistoricalClock`]
/// based on `run_mode`, and registers every configured context with its
/// subscriptions.
#[derive(Debug)]
pub struct SystemBuilder {
    config: SystemConfig,
}

impl SystemBuilder {
    pub fn new(config: SystemConfig) -> Self {
        Self { config }
    }

    /// `trader` is `None` for a pure backtest, or a already-connected
    /// [`TraderAdapter`] (built by the caller from a concrete
    /// `BrokerApi`/`TraderSink` pair) for live trading.
    pub fn build(self, trader: Option<TraderAdapter>) -> Result<System<Box<dyn EngineClock + Send + Sync>>> {
        let registry = Arc::new(build_registry(&self.config.base_data));
        let store = Arc::new(DataStore::open(self.config.store, Arc::clone(&registry)).map_err(WtError::from)?);

        let clock: Box<dyn EngineClock + Send + Sync> = match self.config.run_mode {
            RunMode::Live => Box::new(LiveClock),
            RunMode::Backtest { start, .. } => Box::new(HistoricalClock::new(ymd_to_datetime(start))),
        };

        let mut engine = Engine::new(clock, registry, store, trader, self.config.risk_free_return);
        if let Some(output_dir) = self.config.output_dir.clone() {
            engine.set_output_dir(output_dir);
        }

        for ctx in self.config.contexts {
            let context_id = ctx.strategy.context_id.clone();
            engine.register_context(ctx.strategy, ctx.schedule_driven);

            for sub in ctx.tick_subscriptions {
                engine.subscribe_tick(&context_id, &Exchange::new(sub.exchange), &Code::new(sub.code));
            }
            for sub in ctx.bar_subscriptions {
                engine.subscribe_bar(&context_id, &Exchange::new(sub.exchange), &Code::new(sub.code), sub.period_minutes);
            }
        }

        Ok(System::new(engine))
    }
}

fn build_registry(seed: &BaseDataSeed) -> BaseDataRegistry {
    let mut registry = BaseDataRegistry::new();

    for template in &seed.holiday_templates {
        let mut holidays = HolidayTemplate::default();
        holidays.holidays.extend(template.holidays.iter().copied());
        registry.holidays.insert_template(template.name.as_str(), holidays);
    }
    for session in &seed.sessions {
        registry.insert_session(session.clone());
    }
    for contract in &seed.contracts {
        registry.insert_contract(contract.clone());
    }

    registry
}

fn ymd_to_datetime(ymd: u32) -> chrono::DateTime<Utc> {
    let year = (ymd / 10_000) as i32;
    let month = (ymd / 100) % 100;
    let day = ymd % 100;
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single().unwrap_or_else(|| Utc::now())
}
