//! Rate Resolution Service
//!
//! Orchestrates the cache -> store -> remote lookup through the port traits
//! and backfills the faster layers on the way out. Contains NO
//! infrastructure logic - pure pipeline orchestration.

use chrono::{NaiveDate, Utc};

use rates_types::{
    CurrencyCode, CurrencyListing, CurrencyMeta, PopularityOrder, RateCache, RateEntry,
    RateOrigin, RateSource, RateStore, RefreshSummary, ResolveError, ResolvedRate, SourceError,
};

/// The rate resolution pipeline.
///
/// Generic over its three ports - the adapters are injected at compile time.
/// Infrastructure failures (cache, store) are absorbed here and degrade to a
/// miss on the next layer; only remote-source failures reach the caller, as
/// a typed absence. Concurrent resolutions share the adapters through
/// `&self`; nothing blocks a resolution for a different key.
pub struct RateResolver<C, S, R>
where
    C: RateCache,
    S: RateStore,
    R: RateSource,
{
    cache: C,
    store: S,
    source: R,
}

impl<C, S, R> RateResolver<C, S, R>
where
    C: RateCache,
    S: RateStore,
    R: RateSource,
{
    /// Creates a new resolver over the given adapters.
    pub fn new(cache: C, store: S, source: R) -> Self {
        Self {
            cache,
            store,
            source,
        }
    }

    /// Returns a reference to the underlying cache adapter.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns a reference to the underlying store adapter.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the underlying source adapter.
    pub fn source(&self) -> &R {
        &self.source
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────────

    /// Resolves the rate for `(currency, date)`: cache, then store, then the
    /// remote source, backfilling the faster layers on success. A remote
    /// failure is returned as a typed absence - never an invented rate.
    pub async fn resolve(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<ResolvedRate, ResolveError> {
        // Every resolution attempt counts toward popularity, hit or miss.
        if let Err(e) = self.store.increment_request_count(currency).await {
            tracing::warn!(%currency, "request counter update failed: {e}");
        }

        if let Some(rate) = self.cache_get(currency, date).await {
            tracing::debug!(%currency, %date, rate, "cache hit");
            return Ok(self.format(currency, date, rate, RateOrigin::Cache).await);
        }

        if let Some(rate) = self.store_get(currency, date).await {
            tracing::debug!(%currency, %date, rate, "store hit");
            self.backfill(currency, date, rate).await;
            return Ok(self.format(currency, date, rate, RateOrigin::Store).await);
        }

        let rate = match self.source.fetch_rate(currency, date).await {
            Ok(rate) => rate,
            Err(reason) => {
                tracing::warn!(%currency, %date, "remote fetch failed: {reason}");
                return Err(ResolveError::unavailable(currency.clone(), date, reason));
            }
        };

        let entry = match RateEntry::new(currency.clone(), date, rate, Utc::now()) {
            Ok(entry) => entry,
            Err(e) => {
                // Success status, unusable value: classified as malformed.
                let reason = SourceError::MalformedResponse(e.to_string());
                tracing::warn!(%currency, %date, "remote fetch failed: {reason}");
                return Err(ResolveError::unavailable(currency.clone(), date, reason));
            }
        };

        if let Err(e) = self.store.upsert_rate(&entry).await {
            tracing::warn!(%currency, %date, "rate persist failed: {e}");
        }
        self.backfill(currency, date, rate).await;

        Ok(self.format(currency, date, rate, RateOrigin::Remote).await)
    }

    /// Collaborator-facing currency listing. Store failures degrade to an
    /// empty list.
    pub async fn list_currencies(&self, order: PopularityOrder) -> Vec<CurrencyListing> {
        match self.store.list_currencies(order).await {
            Ok(metas) => metas.into_iter().map(CurrencyListing::from).collect(),
            Err(e) => {
                tracing::warn!("currency listing failed: {e}");
                Vec::new()
            }
        }
    }

    /// Resolves `today`'s rate for each given currency through the canonical
    /// pipeline and upserts the result, so the day's store row exists and
    /// carries the latest resolved value. Idempotent per day: a re-run finds
    /// the same keys and overwrites them. Per-currency failures are logged
    /// and collected, never aborting the batch.
    pub async fn refresh_daily_rates(
        &self,
        currencies: &[CurrencyCode],
        today: NaiveDate,
    ) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for currency in currencies {
            match self.resolve(currency, today).await {
                Ok(resolved) => {
                    summary.refreshed += 1;
                    match RateEntry::new(currency.clone(), today, resolved.rate, Utc::now()) {
                        Ok(entry) => {
                            if let Err(e) = self.store.upsert_rate(&entry).await {
                                tracing::warn!(%currency, %today, "refresh persist failed: {e}");
                            }
                        }
                        Err(e) => {
                            tracing::warn!(%currency, "refresh skipped unusable rate: {e}");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("daily refresh: {e}");
                    summary.failed.push(currency.clone());
                }
            }
        }

        tracing::info!(
            refreshed = summary.refreshed,
            failed = summary.failed.len(),
            %today,
            "daily rates refresh finished"
        );
        summary
    }

    /// Pulls the remote currency reference and refreshes the local metadata
    /// rows, preserving request counters. Returns how many entries were
    /// applied.
    pub async fn sync_currency_reference(&self) -> Result<usize, SourceError> {
        let listings = self.source.fetch_currencies().await?;

        let mut applied = 0;
        for listing in &listings {
            let meta = CurrencyMeta::new(
                listing.code.clone(),
                listing.display_name.clone(),
                listing.scale,
            );
            match self.store.upsert_currency_meta(&meta).await {
                Ok(()) => applied += 1,
                Err(e) => tracing::warn!(code = %listing.code, "reference upsert failed: {e}"),
            }
        }

        tracing::info!(applied, total = listings.len(), "currency reference synced");
        Ok(applied)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Degrade-to-miss helpers
    // ─────────────────────────────────────────────────────────────────────────────

    async fn cache_get(&self, currency: &CurrencyCode, date: NaiveDate) -> Option<f64> {
        match self.cache.get(currency, date).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(%currency, %date, "cache read failed, treating as miss: {e}");
                None
            }
        }
    }

    async fn store_get(&self, currency: &CurrencyCode, date: NaiveDate) -> Option<f64> {
        match self.store.get_rate(currency, date).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(%currency, %date, "store read failed, treating as miss: {e}");
                None
            }
        }
    }

    async fn backfill(&self, currency: &CurrencyCode, date: NaiveDate, rate: f64) {
        if let Err(e) = self.cache.put(currency, date, rate).await {
            tracing::warn!(%currency, %date, "cache backfill failed: {e}");
        }
    }

    /// Formats through the currency reference; a missing or unreadable row
    /// falls back to the raw code with a scale of 1, so resolution never
    /// fails solely because metadata is absent.
    async fn format(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
        rate: f64,
        origin: RateOrigin,
    ) -> ResolvedRate {
        let meta = match self.store.get_currency_meta(currency).await {
            Ok(Some(meta)) => meta,
            Ok(None) => CurrencyMeta::fallback(currency.clone()),
            Err(e) => {
                tracing::warn!(%currency, "metadata read failed, using fallback: {e}");
                CurrencyMeta::fallback(currency.clone())
            }
        };
        ResolvedRate::from_meta(&meta, date, rate, origin)
    }
}
