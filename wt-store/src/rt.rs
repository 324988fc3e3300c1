use bytemuck::{Pod, Zeroable};
use memmap2::{MmapMut, MmapOptions};
use parking_lot::RwLock;
use smol_str::SmolStr;
use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::block::{BlockHeader, BlockVersion, StreamKind};
use crate::error::StoreError;

/// `BlockHeader` is 8 `u32`s (32 bytes), a multiple of 8, so the payload
/// that follows it starts 8-byte aligned relative to the mmap's
/// page-aligned base — required for the `f64` fields in every record
/// type this module stores.
const HEADER_SIZE: usize = std::mem::size_of::<BlockHeader>();

struct Mapping {
    file: File,
    mmap: MmapMut,
}

impl Mapping {
    fn header(&self) -> &BlockHeader {
        bytemuck::from_bytes(&self.mmap[..HEADER_SIZE])
    }

    fn header_mut(&mut self) -> &mut BlockHeader {
        bytemuck::from_bytes_mut(&mut self.mmap[..HEADER_SIZE])
    }

    fn payload<T: Pod>(&self) -> &[T] {
        bytemuck::cast_slice(&self.mmap[HEADER_SIZE..])
    }

    fn payload_mut<T: Pod>(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(&mut self.mmap[HEADER_SIZE..])
    }
}

/// A per-(exchange, code, stream) memory-mapped ring block: a
/// fixed-capacity, append-only record array prefixed by a
/// [`BlockHeader`].
///
/// A writer mutating `size` and appending a record concurrently with
/// readers slicing `[0, size)` unlocked would be the minimal-contention
/// shape, but a true lock-free reader is unsound in safe Rust across a
/// `grow` remap (the backing `MmapMut` is replaced, invalidating any
/// live `&[T]` into the old one). This reproduces the same *contention*
/// shape — readers and the writer rarely block each other, growth is
/// the only serialization point — with a `parking_lot::RwLock` rather
/// than raw atomics.
pub struct RtBlock<T> {
    path: PathBuf,
    exchange: SmolStr,
    code: SmolStr,
    kind: StreamKind,
    mapping: RwLock<Mapping>,
    _marker: PhantomData<T>,
}

impl<T: Pod + Zeroable> RtBlock<T> {
    pub fn open_or_create(
        path: impl AsRef<Path>,
        exchange: impl Into<SmolStr>,
        code: impl Into<SmolStr>,
        kind: StreamKind,
        initial_capacity: u32,
        trading_date: u32,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let exchange = exchange.into();
        let code = code.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(path.display().to_string(), e))?;
        }

        let record_size = std::mem::size_of::<T>() as u32;
        let existed = path.exists();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| StoreError::io(path.display().to_string(), e))?;

        if !existed {
            let total = HEADER_SIZE as u64 + (initial_capacity as u64 * record_size as u64);
            file.set_len(total)
                .map_err(|e| StoreError::io(path.display().to_string(), e))?;
            let mut mmap = unsafe { MmapOptions::new().map_mut(&file) }
                .map_err(|e| StoreError::io(path.display().to_string(), e))?;
            let header =
                BlockHeader::new(BlockVersion::RawV2, trading_date, initial_capacity, record_size);
            mmap[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
            mmap.flush()
                .map_err(|e| StoreError::io(path.display().to_string(), e))?;
        }

        let mmap = unsafe { MmapOptions::new().map_mut(&file) }
            .map_err(|e| StoreError::io(path.display().to_string(), e))?;
        let mapping = Mapping { file, mmap };

        if !mapping.header().is_valid() {
            return Err(StoreError::Corruption {
                exchange,
                code,
                stream: kind.directory_name(),
                reason: "bad block header magic/version".to_string(),
            });
        }

        Ok(Self {
            path,
            exchange,
            code,
            kind,
            mapping: RwLock::new(mapping),
            _marker: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.mapping.read().header().size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.mapping.read().header().capacity as usize
    }

    pub fn trading_date(&self) -> u32 {
        self.mapping.read().header().trading_date
    }

    /// Copies out the `[0, size)` slice of records. An owned `Vec` rather
    /// than a borrowed slice: a zero-copy slice valid until the next
    /// write would assume readers that tolerate torn reads across a
    /// remap, which a safe `&[T]` tied to this lock guard cannot
    /// express. The copy is cheap next to the page faults already paid
    /// to bring the mapping in.
    pub fn snapshot(&self) -> Vec<T> {
        let mapping = self.mapping.read();
        let size = mapping.header().size as usize;
        mapping.payload::<T>()[..size].to_vec()
    }

    pub fn last(&self) -> Option<T> {
        let mapping = self.mapping.read();
        let size = mapping.header().size as usize;
        (size > 0).then(|| mapping.payload::<T>()[size - 1])
    }

    /// Appends `record`, growing the file per
    /// [`StreamKind::next_capacity`] first if the block is full.
    pub fn push(&self, record: T, session_minutes: u32) -> Result<(), StoreError> {
        let mut mapping = self.mapping.write();
        let (size, capacity) = {
            let header = mapping.header();
            (header.size, header.capacity)
        };
        if size >= capacity {
            self.grow(&mut mapping, session_minutes)?;
        }
        let size = mapping.header().size as usize;
        mapping.payload_mut::<T>()[size] = record;
        mapping.header_mut().size += 1;
        Ok(())
    }

    /// Overwrites the last record in place (bar accumulation).
    pub fn replace_last(&self, record: T) -> Result<(), StoreError> {
        let mut mapping = self.mapping.write();
        let size = mapping.header().size as usize;
        if size == 0 {
            return Err(StoreError::Corruption {
                exchange: self.exchange.clone(),
                code: self.code.clone(),
                stream: self.kind.directory_name(),
                reason: "replace_last called on an empty block".to_string(),
            });
        }
        mapping.payload_mut::<T>()[size - 1] = record;
        Ok(())
    }

    /// Zeroes `size` back to 0 at session rollover, after the
    /// session-close task has archived the payload, and rebinds the
    /// block to the next trading date.
    pub fn reset(&self, new_trading_date: u32) {
        let mut mapping = self.mapping.write();
        let header = mapping.header_mut();
        header.size = 0;
        header.trading_date = new_trading_date;
    }

    fn grow(&self, mapping: &mut Mapping, session_minutes: u32) -> Result<(), StoreError> {
        let (capacity, record_size) = {
            let header = mapping.header();
            (header.capacity, header.record_size)
        };
        let new_capacity = self.kind.next_capacity(capacity, session_minutes);
        let total = HEADER_SIZE as u64 + (new_capacity as u64 * record_size as u64);
        mapping
            .file
            .set_len(total)
            .map_err(|e| StoreError::io(self.path.display().to_string(), e))?;
        let new_mmap = unsafe { MmapOptions::new().map_mut(&mapping.file) }
            .map_err(|e| StoreError::io(self.path.display().to_string(), e))?;
        mapping.mmap = new_mmap;
        mapping.header_mut().capacity = new_capacity;
        Ok(())
    }
}

impl<T> std::fmt::Debug for RtBlock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtBlock")
            .field("path", &self.path)
            .field("exchange", &self.exchange)
            .field("code", &self.code)
            .field("kind", &self.kind)
            .finish()
    }
}
