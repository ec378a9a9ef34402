//! In-memory TTL cache adapter with JSON snapshot persistence.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rates_types::{CacheError, CurrencyCode, RateCache};

/// Default time-to-live for cached rates: 30 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy)]
struct CacheRecord {
    rate: f64,
    /// Epoch seconds at insertion.
    inserted_at: u64,
}

/// Concurrent TTL cache for resolved rates.
///
/// An explicit instance owned by the resolver, never a process-wide global.
/// Entries live in a concurrent map keyed by `"<CODE>_<YYYY-MM-DD>"`; expiry
/// is lazy on read, with `sweep` available to bound memory. Durability is an
/// explicit `snapshot()` call writing a flat JSON map of
/// `key -> [rate, inserted_at_epoch_secs]`, reloaded on construction. A
/// missing or corrupt snapshot file loads as an empty cache - never an error.
pub struct TtlCache {
    entries: DashMap<String, CacheRecord>,
    ttl: Duration,
    snapshot_path: Option<PathBuf>,
}

fn cache_key(currency: &CurrencyCode, date: NaiveDate) -> String {
    format!("{}_{}", currency, date.format("%Y-%m-%d"))
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl TtlCache {
    /// Creates a cache with the default 30-minute TTL, loading any existing
    /// snapshot at `snapshot_path`.
    pub fn new(snapshot_path: Option<PathBuf>) -> Self {
        Self::with_ttl(snapshot_path, DEFAULT_TTL)
    }

    /// Creates a cache with a custom TTL.
    pub fn with_ttl(snapshot_path: Option<PathBuf>, ttl: Duration) -> Self {
        let entries = DashMap::new();
        if let Some(path) = snapshot_path.as_deref() {
            match load_snapshot(path) {
                Ok(loaded) => {
                    for (key, record) in loaded {
                        entries.insert(key, record);
                    }
                }
                Err(e) => {
                    tracing::warn!("cache snapshot unusable, starting empty: {e}");
                }
            }
        }
        Self {
            entries,
            ttl,
            snapshot_path,
        }
    }

    /// Number of live entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the current entries to the snapshot file. A no-op when the
    /// cache was built without a snapshot path.
    pub fn snapshot(&self) -> Result<(), CacheError> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CacheError::Io(e.to_string()))?;
            }
        }

        let flat: HashMap<String, (f64, u64)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), (entry.value().rate, entry.value().inserted_at)))
            .collect();

        let json =
            serde_json::to_string_pretty(&flat).map_err(|e| CacheError::Io(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| CacheError::Io(e.to_string()))
    }

    fn is_expired(&self, record: &CacheRecord, now: u64) -> bool {
        now.saturating_sub(record.inserted_at) > self.ttl.as_secs()
    }
}

fn load_snapshot(path: &Path) -> Result<Vec<(String, CacheRecord)>, CacheError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| CacheError::Io(e.to_string()))?;
    let parsed: HashMap<String, (f64, u64)> =
        serde_json::from_str(&raw).map_err(|e| CacheError::Corrupt(e.to_string()))?;
    Ok(parsed
        .into_iter()
        .map(|(key, (rate, inserted_at))| (key, CacheRecord { rate, inserted_at }))
        .collect())
}

#[async_trait]
impl RateCache for TtlCache {
    async fn get(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Option<f64>, CacheError> {
        let key = cache_key(currency, date);
        let now = now_epoch();

        // Evict-on-read: an expired record is removed before the lookup, so
        // repeated reads of a stale key all report absent.
        self.entries
            .remove_if(&key, |_, record| self.is_expired(record, now));

        Ok(self.entries.get(&key).map(|record| record.rate))
    }

    async fn put(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
        rate: f64,
    ) -> Result<(), CacheError> {
        let key = cache_key(currency, date);
        self.entries.insert(
            key,
            CacheRecord {
                rate,
                inserted_at: now_epoch(),
            },
        );
        Ok(())
    }

    async fn sweep(&self) -> Result<usize, CacheError> {
        let now = now_epoch();
        let before = self.entries.len();
        self.entries.retain(|_, record| !self.is_expired(record, now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}
