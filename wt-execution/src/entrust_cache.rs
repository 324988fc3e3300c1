use memmap2::{MmapMut, MmapOptions};
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::ExecutionError;

const KEY_LEN: usize = 64;
const VALUE_LEN: usize = 64;
const RECORD_LEN: usize = KEY_LEN + VALUE_LEN;
const HEADER_LEN: usize = 8; // capacity:u32, size:u32

fn io_err(path: &Path, source: std::io::Error) -> ExecutionError {
    ExecutionError::InsertRejected(format!("entrust cache io error on {}: {source}", path.display()))
}

fn pack(s: &str, len: usize) -> Result<Vec<u8>, ExecutionError> {
    if s.len() > len {
        return Err(ExecutionError::InsertRejected(format!(
            "entrust cache entry exceeds {len} bytes: {s}"
        )));
    }
    let mut buf = vec![0u8; len];
    buf[..s.len()].copy_from_slice(s.as_bytes());
    Ok(buf)
}

fn unpack(bytes: &[u8]) -> SmolStr {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    SmolStr::new(String::from_utf8_lossy(&bytes[..end]))
}

/// mmap-backed KV cache for entrust (order-insert) request idempotency:
/// a broker reconnect must not re-submit an order the prior connection
/// already accepted, so every entrust carries a cache key the adapter
/// can check first. Capped at 64-byte keys and values to keep records
/// fixed-stride.
pub struct EntrustCache {
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    file: File,
    mmap: MmapMut,
    capacity: u32,
    size: u32,
}

impl std::fmt::Debug for EntrustCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntrustCache").field("path", &self.path).finish_non_exhaustive()
    }
}

impl EntrustCache {
    pub fn open(path: impl AsRef<Path>, initial_capacity: u32) -> Result<Self, ExecutionError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(&path, e))?;
        }

        let existed = path.exists();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| io_err(&path, e))?;

        if !existed {
            let total = HEADER_LEN as u64 + initial_capacity as u64 * RECORD_LEN as u64;
            file.set_len(total).map_err(|e| io_err(&path, e))?;
            let mut mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(|e| io_err(&path, e))?;
            mmap[0..4].copy_from_slice(&initial_capacity.to_le_bytes());
            mmap[4..8].copy_from_slice(&0u32.to_le_bytes());
            mmap.flush().map_err(|e| io_err(&path, e))?;
        }

        let mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(|e| io_err(&path, e))?;
        let capacity = u32::from_le_bytes(mmap[0..4].try_into().unwrap());
        let size = u32::from_le_bytes(mmap[4..8].try_into().unwrap());

        Ok(Self {
            path,
            inner: Mutex::new(Inner { file, mmap, capacity, size }),
        })
    }

    /// Looks up `key`, scanning the filled records. `O(size)`; entrust
    /// caches hold at most a few thousand live orders, so this is cheap
    /// next to the broker round-trip it's guarding.
    pub fn get(&self, key: &str) -> Option<SmolStr> {
        let inner = self.inner.lock();
        for idx in 0..inner.size {
            let record = inner.record(idx);
            let record_key = unpack(&record[..KEY_LEN]);
            if record_key.as_str() == key {
                return Some(unpack(&record[KEY_LEN..]));
            }
        }
        None
    }

    /// Inserts or overwrites `key`'s value, growing the backing file
    /// (doubling) if every slot is already filled.
    pub fn put(&self, key: &str, value: &str) -> Result<(), ExecutionError> {
        let packed_key = pack(key, KEY_LEN)?;
        let packed_value = pack(value, VALUE_LEN)?;

        let mut inner = self.inner.lock();
        for idx in 0..inner.size {
            if inner.record(idx)[..KEY_LEN] == packed_key[..] {
                inner.record_mut(idx)[KEY_LEN..].copy_from_slice(&packed_value);
                return Ok(());
            }
        }

        if inner.size >= inner.capacity {
            inner.grow(&self.path)?;
        }
        let idx = inner.size;
        inner.record_mut(idx)[..KEY_LEN].copy_from_slice(&packed_key);
        inner.record_mut(idx)[KEY_LEN..].copy_from_slice(&packed_value);
        inner.size += 1;
        let size_bytes = inner.size.to_le_bytes();
        inner.mmap[4..8].copy_from_slice(&size_bytes);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Inner {
    fn record(&self, idx: u32) -> &[u8] {
        let start = HEADER_LEN + idx as usize * RECORD_LEN;
        &self.mmap[start..start + RECORD_LEN]
    }

    fn record_mut(&mut self, idx: u32) -> &mut [u8] {
        let start = HEADER_LEN + idx as usize * RECORD_LEN;
        &mut self.mmap[start..start + RECORD_LEN]
    }

    fn grow(&mut self, path: &Path) -> Result<(), ExecutionError> {
        let new_capacity = self.capacity.saturating_mul(2).max(1);
        let total = HEADER_LEN as u64 + new_capacity as u64 * RECORD_LEN as u64;
        self.file.set_len(total).map_err(|e| io_err(path, e))?;
        self.mmap = unsafe { MmapOptions::new().map_mut(&self.file) }.map_err(|e| io_err(path, e))?;
        self.capacity = new_capacity;
        self.mmap[0..4].copy_from_slice(&new_capacity.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntrustCache::open(dir.path().join("entrust.kv"), 4).unwrap();
        cache.put("SHFE.rb2410#1", "front1#sess1#ref1").unwrap();
        assert_eq!(cache.get("SHFE.rb2410#1").unwrap(), "front1#sess1#ref1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn put_overwrites_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntrustCache::open(dir.path().join("entrust.kv"), 4).unwrap();
        cache.put("k", "v1").unwrap();
        cache.put("k", "v2").unwrap();
        assert_eq!(cache.get("k").unwrap(), "v2");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntrustCache::open(dir.path().join("entrust.kv"), 2).unwrap();
        for i in 0..5 {
            cache.put(&format!("k{i}"), &format!("v{i}")).unwrap();
        }
        assert_eq!(cache.len(), 5);
        assert_eq!(cache.get("k3").unwrap(), "v3");
    }

    #[test]
    fn reopening_preserves_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entrust.kv");
        {
            let cache = EntrustCache::open(&path, 4).unwrap();
            cache.put("k", "v").unwrap();
        }
        let reopened = EntrustCache::open(&path, 4).unwrap();
        assert_eq!(reopened.get("k").unwrap(), "v");
    }

    #[test]
    fn rejects_oversized_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntrustCache::open(dir.path().join("entrust.kv"), 4).unwrap();
        let too_long = "x".repeat(KEY_LEN + 1);
        assert!(cache.put(&too_long, "v").is_err());
    }
}
