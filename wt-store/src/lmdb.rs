use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use std::path::Path;

use crate::error::StoreError;
use crate::record::{BarRecord, TickRecord};

const EXCHG_LEN: usize = 16;
const CODE_LEN: usize = 32;

fn pack_fixed(s: &str, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    let bytes = s.as_bytes();
    let n = bytes.len().min(len);
    buf[..n].copy_from_slice(&bytes[..n]);
    buf
}

/// `LMDBBarKey{exchg[16], code[32], bar_time:u64}`, packed big-endian so
/// LMDB's lexicographic key order doubles as time order within a
/// `(exchg, code)` prefix.
pub fn pack_bar_key(exchange: &str, code: &str, bar_time: u64) -> Vec<u8> {
    let mut key = pack_fixed(exchange, EXCHG_LEN);
    key.extend(pack_fixed(code, CODE_LEN));
    key.extend_from_slice(&bar_time.to_be_bytes());
    key
}

/// `LMDBHftKey{exchg, code, tdate, off_time}`, used for the tick/L2
/// streams.
pub fn pack_hft_key(exchange: &str, code: &str, tdate: u32, off_time: u32) -> Vec<u8> {
    let mut key = pack_fixed(exchange, EXCHG_LEN);
    key.extend(pack_fixed(code, CODE_LEN));
    key.extend_from_slice(&tdate.to_be_bytes());
    key.extend_from_slice(&off_time.to_be_bytes());
    key
}

fn key_prefix(exchange: &str, code: &str) -> Vec<u8> {
    let mut key = pack_fixed(exchange, EXCHG_LEN);
    key.extend(pack_fixed(code, CODE_LEN));
    key
}

fn bar_time(bar: &BarRecord) -> u64 {
    (bar.date as u64) * 10_000 + bar.time as u64
}

/// The LMDB-keyed variant store: an alternative to the RT/HIS
/// append-compressed layers for workloads that need random access by
/// time rather than tail reads. Not mutually exclusive with them —
/// [`crate::config::EnabledLayers`] may enable any combination.
pub struct LmdbStore {
    env: Env,
    bars: Database<Bytes, Bytes>,
    ticks: Database<Bytes, Bytes>,
}

impl std::fmt::Debug for LmdbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbStore").finish_non_exhaustive()
    }
}

impl LmdbStore {
    pub fn open(dir: &Path, map_size_bytes: usize) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir.display().to_string(), e))?;

        // SAFETY: `dir` is a directory this process controls and no other
        // process concurrently opens the same LMDB environment.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size_bytes)
                .max_dbs(2)
                .open(dir)
        }?;

        let mut wtxn = env.write_txn()?;
        let bars: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("bars"))?;
        let ticks: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("ticks"))?;
        wtxn.commit()?;

        Ok(Self { env, bars, ticks })
    }

    pub fn put_bar(&self, exchange: &str, code: &str, bar: &BarRecord) -> Result<(), StoreError> {
        let key = pack_bar_key(exchange, code, bar_time(bar));
        let mut wtxn = self.env.write_txn()?;
        self.bars.put(&mut wtxn, &key, bytemuck::bytes_of(bar))?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn range_bars(&self, exchange: &str, code: &str) -> Result<Vec<BarRecord>, StoreError> {
        let prefix = key_prefix(exchange, code);
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for item in self.bars.prefix_iter(&rtxn, &prefix)? {
            let (_key, value) = item?;
            out.push(*bytemuck::from_bytes::<BarRecord>(value));
        }
        Ok(out)
    }

    pub fn put_tick(
        &self,
        exchange: &str,
        code: &str,
        tdate: u32,
        off_time: u32,
        tick: &TickRecord,
    ) -> Result<(), StoreError> {
        let key = pack_hft_key(exchange, code, tdate, off_time);
        let mut wtxn = self.env.write_txn()?;
        self.ticks.put(&mut wtxn, &key, bytemuck::bytes_of(tick))?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn range_ticks(&self, exchange: &str, code: &str) -> Result<Vec<TickRecord>, StoreError> {
        let prefix = key_prefix(exchange, code);
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for item in self.ticks.prefix_iter(&rtxn, &prefix)? {
            let (_key, value) = item?;
            out.push(*bytemuck::from_bytes::<TickRecord>(value));
        }
        Ok(out)
    }
}
