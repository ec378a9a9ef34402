//! Cache store port trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::CurrencyCode;
use crate::error::CacheError;

/// Port trait for the short-lived rate cache.
///
/// Only numeric rates cross this boundary; formatting happens strictly after
/// resolution. Implementations are shared by many concurrent resolutions and
/// must keep each per-key read-check-evict step atomic.
#[async_trait]
pub trait RateCache: Send + Sync + 'static {
    /// Returns the cached rate if present and within TTL. An expired entry
    /// is evicted as a side effect of the read and reported as absent, so a
    /// second `get` also returns absent.
    async fn get(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Option<f64>, CacheError>;

    /// Inserts or overwrites the record, stamped with the current time.
    async fn put(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
        rate: f64,
    ) -> Result<(), CacheError>;

    /// Evicts every record past TTL and returns how many were removed.
    /// Not required for correctness (lazy eviction suffices) but bounds
    /// memory growth.
    async fn sweep(&self) -> Result<usize, CacheError>;
}
