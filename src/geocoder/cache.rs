//! File-based geocode cache at ~/.label_geocoder/cache.json.
//!
//! TTL: 30 days. Keys are the assembled query, lowercased with whitespace
//! collapsed. Only successful lookups are stored. Writes are held in memory
//! until `flush`.

use super::types::GeocodeResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CACHE_TTL_MS: i64 = 30 * 24 * 3600 * 1000; // 30 days in ms

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    result: GeocodeResult,
    timestamp: i64,
}

/// The geocode result cache.
pub struct GeocodeCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
    /// Changes not yet written to disk.
    pending: usize,
}

impl GeocodeCache {
    /// Load cache from the default location.
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load cache from a specific path. A missing or unreadable file yields an empty cache.
    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self {
            path,
            entries,
            pending: 0,
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".label_geocoder")
            .join("cache.json")
    }

    fn read_file(path: &Path) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable geocode cache");
                None
            }
        }
    }

    fn key(query: &str) -> String {
        query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Look up a query. Returns None if missing or expired.
    pub fn get(&self, query: &str) -> Option<GeocodeResult> {
        let entry = self.entries.get(&Self::key(query))?;

        let now = chrono::Utc::now().timestamp_millis();
        if now - entry.timestamp > CACHE_TTL_MS {
            return None; // expired
        }

        Some(entry.result.clone())
    }

    /// Store a successful result. Not written to disk until `flush`.
    pub fn put(&mut self, query: &str, result: &GeocodeResult) {
        let entry = CacheEntry {
            result: result.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.entries.insert(Self::key(query), entry);
        self.pending += 1;
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn prune_expired(&mut self) -> usize {
        let now = chrono::Utc::now().timestamp_millis();
        let before = self.entries.len();
        self.entries.retain(|_, e| now - e.timestamp <= CACHE_TTL_MS);
        let removed = before - self.entries.len();
        self.pending += removed;
        removed
    }

    /// Number of changes since the last successful flush.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Write the cache to disk if anything changed. A failed write is logged
    /// and retried on the next flush.
    pub fn flush(&mut self) {
        if self.pending == 0 {
            return;
        }
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let written = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&self.path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => {
                debug!(
                    path = %self.path.display(),
                    entries = self.entries.len(),
                    "geocode cache saved"
                );
                self.pending = 0;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to persist geocode cache");
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
