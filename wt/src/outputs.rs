use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use wt_strategy::{CloseLog, TradeLog};

use crate::statistic::summary::TradingSummary;
use crate::statistic::time::TimeInterval;

/// Errors raised while writing a context's output files.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error writing {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("json error writing {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize)]
struct TradeRow<'a> {
    code: &'a str,
    time: u32,
    direct: &'static str,
    action: &'static str,
    price: f64,
    qty: i64,
    tag: &'a str,
    fee: f64,
    barno: u64,
}

#[derive(Serialize)]
struct CloseRow<'a> {
    code: &'a str,
    direct: &'static str,
    opentime: u32,
    openprice: f64,
    closetime: u32,
    closeprice: f64,
    qty: i64,
    profit: f64,
    maxprofit: f64,
    maxloss: f64,
    totalprofit: f64,
    entertag: &'a str,
    exittag: &'a str,
    openbarno: u64,
    closebarno: u64,
}

#[derive(Serialize)]
struct FundRow {
    date: u32,
    closeprofit: f64,
    positionprofit: f64,
    dynbalance: f64,
    fee: f64,
}

#[derive(Serialize)]
struct SignalRow<'a> {
    code: &'a str,
    target: i64,
    sigprice: f64,
    gentime: u32,
    usertag: &'a str,
}

#[derive(Serialize)]
struct PositionRow<'a> {
    date: u32,
    code: &'a str,
    volume: i64,
    closeprofit: f64,
    dynprofit: f64,
}

/// One named series (`indice.csv`'s `index_name`/`line_name` pair) a
/// strategy wants plotted alongside its K-line in `btchart.json`.
#[derive(Debug, Clone, Serialize)]
pub struct IndiceRow {
    pub bartime: u32,
    pub index_name: String,
    pub line_name: String,
    pub value: f64,
}

/// One chart annotation (`marks.csv`), eg/ a buy/sell arrow.
#[derive(Debug, Clone, Serialize)]
pub struct MarkRow {
    pub bartime: u32,
    pub price: f64,
    pub icon: String,
    pub tag: String,
}

fn open_append(path: &Path) -> Result<File, OutputError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| OutputError::Io { path: path.to_path_buf(), source })
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, OutputError> {
    let needs_header = !path.exists() || fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = open_append(path)?;
    Ok(csv::WriterBuilder::new().has_headers(needs_header).from_writer(file))
}

/// Writes the per-context CSV/JSON files a backtest or live session
/// leaves behind under `outputs/{context_id}/`: trade/close logs,
/// per-trading-day fund/position rows, pending signals, custom chart
/// indices and marks, and the end-of-run state and user-data dumps.
#[derive(Debug)]
pub struct OutputWriter {
    dir: PathBuf,
    context_id: String,
}

impl OutputWriter {
    pub fn open(output_dir: &Path, context_id: &str) -> Result<Self, OutputError> {
        let dir = output_dir.join(context_id);
        fs::create_dir_all(&dir).map_err(|source| OutputError::Io { path: dir.clone(), source })?;
        Ok(Self { dir, context_id: context_id.to_string() })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// `action` is `"OPEN"` for a fresh lot or `"CLOSE"` for the closing
    /// leg synthesized from a [`CloseLog`] — every fill gets a trade row,
    /// matching the original backtester's ledger.
    pub fn append_trade(&self, trade: &TradeLog, action: &'static str, barno: u64) -> Result<(), OutputError> {
        let path = self.path("trades.csv");
        let mut writer = csv_writer(&path)?;
        let row = TradeRow {
            code: trade.code.as_str(),
            time: trade.enter_time,
            direct: if trade.direction.is_long() { "long" } else { "short" },
            action,
            price: trade.price,
            qty: trade.volume,
            tag: trade.user_tag.as_str(),
            fee: trade.fee,
            barno,
        };
        writer.serialize(row).map_err(|source| OutputError::Csv { path: path.clone(), source })?;
        writer.flush().map_err(|source| OutputError::Io { path, source })
    }

    pub fn append_close(&self, close: &CloseLog, open_barno: u64, close_barno: u64) -> Result<(), OutputError> {
        let path = self.path("closes.csv");
        let mut writer = csv_writer(&path)?;
        let row = CloseRow {
            code: close.code.as_str(),
            direct: if close.direction.is_long() { "long" } else { "short" },
            opentime: close.open_time,
            openprice: close.open_price,
            closetime: close.close_time,
            closeprice: close.close_price,
            qty: close.volume,
            profit: close.profit,
            maxprofit: close.max_profit,
            maxloss: close.max_loss,
            totalprofit: close.total_profit,
            entertag: close.enter_tag.as_str(),
            exittag: close.exit_tag.as_str(),
            openbarno: open_barno,
            closebarno: close_barno,
        };
        writer.serialize(row).map_err(|source| OutputError::Csv { path: path.clone(), source })?;
        writer.flush().map_err(|source| OutputError::Io { path, source })
    }

    pub fn append_fund(&self, date: u32, closeprofit: f64, positionprofit: f64, dynbalance: f64, fee: f64) -> Result<(), OutputError> {
        let path = self.path("funds.csv");
        let mut writer = csv_writer(&path)?;
        writer
            .serialize(FundRow { date, closeprofit, positionprofit, dynbalance, fee })
            .map_err(|source| OutputError::Csv { path: path.clone(), source })?;
        writer.flush().map_err(|source| OutputError::Io { path, source })
    }

    pub fn append_signal(&self, code: &str, target: i64, sigprice: f64, gentime: u32, usertag: &str) -> Result<(), OutputError> {
        let path = self.path("signals.csv");
        let mut writer = csv_writer(&path)?;
        writer
            .serialize(SignalRow { code, target, sigprice, gentime, usertag })
            .map_err(|source| OutputError::Csv { path: path.clone(), source })?;
        writer.flush().map_err(|source| OutputError::Io { path, source })
    }

    pub fn append_position(&self, date: u32, code: &str, volume: i64, closeprofit: f64, dynprofit: f64) -> Result<(), OutputError> {
        let path = self.path("positions.csv");
        let mut writer = csv_writer(&path)?;
        writer
            .serialize(PositionRow { date, code, volume, closeprofit, dynprofit })
            .map_err(|source| OutputError::Csv { path: path.clone(), source })?;
        writer.flush().map_err(|source| OutputError::Io { path, source })
    }

    pub fn append_indice(&self, row: &IndiceRow) -> Result<(), OutputError> {
        let path = self.path("indice.csv");
        let mut writer = csv_writer(&path)?;
        writer.serialize(row).map_err(|source| OutputError::Csv { path: path.clone(), source })?;
        writer.flush().map_err(|source| OutputError::Io { path, source })
    }

    pub fn append_mark(&self, row: &MarkRow) -> Result<(), OutputError> {
        let path = self.path("marks.csv");
        let mut writer = csv_writer(&path)?;
        writer.serialize(row).map_err(|source| OutputError::Csv { path: path.clone(), source })?;
        writer.flush().map_err(|source| OutputError::Io { path, source })
    }

    /// Dumps `{name}.json`: the end-of-run statistics block plus
    /// whatever caller-supplied state snapshot (positions, details,
    /// fund, pending signals, conditional orders) should accompany it.
    pub fn write_state<Interval: TimeInterval>(&self, summary: &TradingSummary<Interval>, state: &serde_json::Value) -> Result<(), OutputError> {
        let path = self.path(&format!("{}.json", self.context_id));
        let body = serde_json::json!({ "statistics": summary, "state": state });
        let file = File::create(&path).map_err(|source| OutputError::Io { path: path.clone(), source })?;
        serde_json::to_writer_pretty(file, &body).map_err(|source| OutputError::Json { path, source })
    }

    /// Dumps `ud_{name}.json`, the user-data key-value store.
    pub fn write_user_data(&self, data: &std::collections::HashMap<String, String>) -> Result<(), OutputError> {
        let path = self.path(&format!("ud_{}.json", self.context_id));
        let file = File::create(&path).map_err(|source| OutputError::Io { path: path.clone(), source })?;
        serde_json::to_writer_pretty(file, data).map_err(|source| OutputError::Json { path, source })
    }

    /// Dumps `btchart.json`: the accumulated chart indices and marks
    /// alongside a caller-supplied K-line payload.
    pub fn write_chart(&self, kline: &serde_json::Value, indices: &[IndiceRow], marks: &[MarkRow]) -> Result<(), OutputError> {
        let path = self.path("btchart.json");
        let body = serde_json::json!({ "kline": kline, "indices": indices, "marks": marks });
        let file = File::create(&path).map_err(|source| OutputError::Io { path: path.clone(), source })?;
        serde_json::to_writer_pretty(file, &body).map_err(|source| OutputError::Json { path, source })
    }
}
