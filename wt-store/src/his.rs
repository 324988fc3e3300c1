use bytemuck::Pod;
use smol_str::SmolStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::block::{BlockHeader, BlockVersion, StreamKind};
use crate::error::StoreError;

const HEADER_SIZE: usize = std::mem::size_of::<BlockHeader>();

/// Path to a HIS archive file:
/// `his/{stream}/{exchange}/[{tdate}/]{code}.dsb`. Tick/L2 streams key by
/// trading date (one file per trading day); bar streams accumulate every
/// day into a single growing file, so `tdate` is omitted for them.
pub fn archive_path(
    his_dir: &Path,
    kind: StreamKind,
    exchange: &SmolStr,
    code: &SmolStr,
    tdate: Option<u32>,
) -> PathBuf {
    let mut path = his_dir.join(kind.directory_name()).join(exchange.as_str());
    if let Some(tdate) = tdate {
        path = path.join(tdate.to_string());
    }
    path.join(format!("{code}.dsb"))
}

fn write_compressed(path: &Path, record_size: u32, payload: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(path.display().to_string(), e))?;
    }

    let compressed = lz4_flex::compress_prepend_size(payload);
    let header = {
        let mut h = BlockHeader::new(BlockVersion::CmpV2, 0, 0, record_size);
        h.uncompressed_size = payload.len() as u32;
        h
    };

    let mut bytes = Vec::with_capacity(HEADER_SIZE + compressed.len());
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    bytes.extend_from_slice(&compressed);

    // Truncate + write atomically via a temp file + rename.
    let tmp_path = path.with_extension("dsb.tmp");
    fs::write(&tmp_path, &bytes).map_err(|e| StoreError::io(tmp_path.display().to_string(), e))?;
    fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path.display().to_string(), e))?;
    Ok(())
}

fn read_compressed(path: &Path) -> Result<Vec<u8>, StoreError> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path.display().to_string(), e))?;
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::Corruption {
            exchange: SmolStr::default(),
            code: SmolStr::default(),
            stream: "his",
            reason: "archive file shorter than its header".to_string(),
        });
    }
    let header: BlockHeader = *bytemuck::from_bytes(&bytes[..HEADER_SIZE]);
    if !header.is_valid() || !BlockVersion::from_u32(header.version).unwrap().is_compressed() {
        return Err(StoreError::Corruption {
            exchange: SmolStr::default(),
            code: SmolStr::default(),
            stream: "his",
            reason: "archive header is not a valid compressed block".to_string(),
        });
    }
    lz4_flex::decompress_size_prepended(&bytes[HEADER_SIZE..]).map_err(|e| StoreError::Compression {
        exchange: SmolStr::default(),
        code: SmolStr::default(),
        reason: e.to_string(),
    })
}

/// Writes a brand-new tick/L2 archive file for a just-closed trading
/// day: one file per trading day, no merge needed since the RT block
/// held exactly that day's records.
pub fn write_new_archive<T: Pod>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    write_compressed(path, std::mem::size_of::<T>() as u32, bytemuck::cast_slice(records))
}

/// Reads back a tick/L2 archive written by [`write_new_archive`].
pub fn read_archive<T: Pod + Clone>(path: &Path) -> Result<Vec<T>, StoreError> {
    let payload = read_compressed(path)?;
    Ok(bytemuck::cast_slice::<u8, T>(&payload).to_vec())
}

/// Appends `new_bars` onto whatever bar archive already exists at
/// `path`: decompress, append deduplicating by `(date, time)`,
/// recompress, write back. If no archive exists yet this degenerates to
/// [`write_new_archive`].
pub fn append_bar_archive(
    path: &Path,
    new_bars: &[crate::record::BarRecord],
) -> Result<(), StoreError> {
    let mut existing: Vec<crate::record::BarRecord> = if path.exists() {
        read_archive(path)?
    } else {
        Vec::new()
    };

    for bar in new_bars {
        match existing
            .iter()
            .position(|b| b.date == bar.date && b.time == bar.time)
        {
            Some(idx) => existing[idx] = *bar,
            None => existing.push(*bar),
        }
    }
    existing.sort_by_key(|b| (b.date, b.time));

    write_new_archive(path, &existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BarRecord;

    fn bar(date: u32, time: u32, close: f64) -> BarRecord {
        BarRecord {
            date,
            time,
            open: close,
            high: close,
            low: close,
            close,
            settle: 0.0,
            vol: 10,
            money: close * 10.0,
            hold: 0,
            add: 0,
            bid: 0.0,
            ask: 0.0,
        }
    }

    #[test]
    fn archive_path_keys_ticks_by_tdate_and_bars_without() {
        let his_dir = Path::new("/data/his");
        let exchange = SmolStr::new("SHFE");
        let code = SmolStr::new("rb2410");

        let tick_path = archive_path(his_dir, StreamKind::Tick, &exchange, &code, Some(20240102));
        assert_eq!(tick_path, his_dir.join("ticks/SHFE/20240102/rb2410.dsb"));

        let bar_path = archive_path(his_dir, StreamKind::Bar1m, &exchange, &code, None);
        assert_eq!(bar_path, his_dir.join("min1/SHFE/rb2410.dsb"));
    }

    #[test]
    fn write_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rb2410.dsb");
        let bars = vec![bar(20240102, 901, 3500.0), bar(20240102, 902, 3505.0)];
        write_new_archive(&path, &bars).unwrap();

        let back: Vec<BarRecord> = read_archive(&path).unwrap();
        assert_eq!(back, bars);
    }

    #[test]
    fn append_dedups_by_date_and_time_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rb2410.dsb");
        write_new_archive(&path, &[bar(20240102, 901, 3500.0)]).unwrap();

        append_bar_archive(&path, &[bar(20240102, 901, 3501.0), bar(20240102, 900, 3490.0)]).unwrap();

        let back: Vec<BarRecord> = read_archive(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].time, 900);
        assert_eq!(back[1].time, 901);
        assert_eq!(back[1].close, 3501.0);
    }
}
