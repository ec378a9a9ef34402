//! Persistent store port trait.
//!
//! This is the durable layer behind the cache. Adapters (SQLite today)
//! implement this trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{CurrencyCode, CurrencyMeta, RateEntry};
use crate::dto::PopularityOrder;
use crate::error::StoreError;

/// Port trait for the durable rate and currency-reference tables.
///
/// At most one authoritative rate exists per `(currency, date)`. Each
/// individual operation must be atomic with respect to concurrent accesses
/// to the same key; no cross-key transactions are required.
#[async_trait]
pub trait RateStore: Send + Sync + 'static {
    /// Point lookup by exact date. No range queries, no interpolation for
    /// missing dates.
    async fn get_rate(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Option<f64>, StoreError>;

    /// Insert-or-replace keyed by `(currency, date)`; last write wins.
    async fn upsert_rate(&self, entry: &RateEntry) -> Result<(), StoreError>;

    async fn get_currency_meta(
        &self,
        currency: &CurrencyCode,
    ) -> Result<Option<CurrencyMeta>, StoreError>;

    /// Atomic counter increment; creates the metadata row with a count of 1
    /// if absent.
    async fn increment_request_count(&self, currency: &CurrencyCode) -> Result<(), StoreError>;

    /// All known currencies in the requested popularity order.
    async fn list_currencies(
        &self,
        order: PopularityOrder,
    ) -> Result<Vec<CurrencyMeta>, StoreError>;

    /// Refreshes display name and scale from the remote reference while
    /// preserving the request counter.
    async fn upsert_currency_meta(&self, meta: &CurrencyMeta) -> Result<(), StoreError>;
}
