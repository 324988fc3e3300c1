use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fs;
use std::path::Path;

use crate::error::StoreError;

/// Tracks, per session-id, the trading date whose session-close rollover
/// has already run — the idempotency record consulted by
/// `is_session_proceeded` so a restart doesn't redo (and double-append)
/// an archive rollover.
///
/// Persisted as a flat `[markers]` INI section, `session_id = tdate`.
#[derive(Debug, Clone, Default)]
pub struct MarkerFile {
    markers: IndexMap<SmolStr, u32>,
}

impl MarkerFile {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|e| StoreError::io(path.display().to_string(), e))?;
        let mut markers = IndexMap::new();
        let mut in_markers_section = false;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                in_markers_section = line.eq_ignore_ascii_case("[markers]");
                continue;
            }
            if !in_markers_section {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                if let Ok(tdate) = value.trim().parse::<u32>() {
                    markers.insert(SmolStr::new(key.trim()), tdate);
                }
            }
        }
        Ok(Self { markers })
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let mut text = String::from("[markers]\n");
        for (session_id, tdate) in &self.markers {
            text.push_str(&format!("{session_id} = {tdate}\n"));
        }
        fs::write(path, text).map_err(|e| StoreError::io(path.display().to_string(), e))
    }

    pub fn last_processed(&self, session_id: &str) -> Option<u32> {
        self.markers.get(session_id).copied()
    }

    pub fn mark_processed(&mut self, session_id: impl Into<SmolStr>, tdate: u32) {
        self.markers.insert(session_id.into(), tdate);
    }

    /// True if the session-close rollover for `session_id`/`tdate` has
    /// already run, ie/ this tdate (or a later one) is already recorded.
    pub fn is_session_proceeded(&self, session_id: &str, tdate: u32) -> bool {
        self.last_processed(session_id).is_some_and(|marked| marked >= tdate)
    }
}
