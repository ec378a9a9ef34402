//! RateResolver unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use rates_types::{
        CacheError, CurrencyCode, CurrencyListing, CurrencyMeta, PopularityOrder, RateCache,
        RateEntry, RateOrigin, RateSource, RateStore, ResolveError, SourceError, StoreError,
    };

    use crate::RateResolver;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Mock adapters
    // ─────────────────────────────────────────────────────────────────────────────

    /// In-memory cache for testing the resolver, with optional forced failure.
    pub struct MockCache {
        entries: Mutex<HashMap<(CurrencyCode, NaiveDate), f64>>,
        fail: bool,
    }

    impl MockCache {
        pub fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                fail: true,
            }
        }

        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        pub fn rate(&self, currency: &CurrencyCode, on: NaiveDate) -> Option<f64> {
            self.entries.lock().unwrap().get(&(currency.clone(), on)).copied()
        }

        pub fn seed(&self, currency: &CurrencyCode, on: NaiveDate, rate: f64) {
            self.entries.lock().unwrap().insert((currency.clone(), on), rate);
        }
    }

    #[async_trait]
    impl RateCache for MockCache {
        async fn get(
            &self,
            currency: &CurrencyCode,
            date: NaiveDate,
        ) -> Result<Option<f64>, CacheError> {
            if self.fail {
                return Err(CacheError::Io("cache offline".into()));
            }
            Ok(self.rate(currency, date))
        }

        async fn put(
            &self,
            currency: &CurrencyCode,
            date: NaiveDate,
            rate: f64,
        ) -> Result<(), CacheError> {
            if self.fail {
                return Err(CacheError::Io("cache offline".into()));
            }
            self.seed(currency, date, rate);
            Ok(())
        }

        async fn sweep(&self) -> Result<usize, CacheError> {
            Ok(0)
        }
    }

    /// In-memory store for testing the resolver, counting rate lookups.
    pub struct MockStore {
        rates: Mutex<HashMap<(CurrencyCode, NaiveDate), f64>>,
        meta: Mutex<HashMap<CurrencyCode, CurrencyMeta>>,
        rate_lookups: AtomicUsize,
        fail: bool,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self {
                rates: Mutex::new(HashMap::new()),
                meta: Mutex::new(HashMap::new()),
                rate_lookups: AtomicUsize::new(0),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                rates: Mutex::new(HashMap::new()),
                meta: Mutex::new(HashMap::new()),
                rate_lookups: AtomicUsize::new(0),
                fail: true,
            }
        }

        pub fn seed_rate(&self, currency: &CurrencyCode, on: NaiveDate, rate: f64) {
            self.rates.lock().unwrap().insert((currency.clone(), on), rate);
        }

        pub fn seed_meta(&self, meta: CurrencyMeta) {
            self.meta.lock().unwrap().insert(meta.code.clone(), meta);
        }

        pub fn rate(&self, currency: &CurrencyCode, on: NaiveDate) -> Option<f64> {
            self.rates.lock().unwrap().get(&(currency.clone(), on)).copied()
        }

        pub fn rate_count(&self) -> usize {
            self.rates.lock().unwrap().len()
        }

        pub fn rate_lookups(&self) -> usize {
            self.rate_lookups.load(Ordering::SeqCst)
        }

        pub fn request_count(&self, currency: &CurrencyCode) -> i64 {
            self.meta
                .lock()
                .unwrap()
                .get(currency)
                .map(|m| m.request_count)
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl RateStore for MockStore {
        async fn get_rate(
            &self,
            currency: &CurrencyCode,
            date: NaiveDate,
        ) -> Result<Option<f64>, StoreError> {
            self.rate_lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::Database("db offline".into()));
            }
            Ok(self.rate(currency, date))
        }

        async fn upsert_rate(&self, entry: &RateEntry) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Database("db offline".into()));
            }
            self.seed_rate(&entry.currency, entry.date, entry.rate);
            Ok(())
        }

        async fn get_currency_meta(
            &self,
            currency: &CurrencyCode,
        ) -> Result<Option<CurrencyMeta>, StoreError> {
            if self.fail {
                return Err(StoreError::Database("db offline".into()));
            }
            Ok(self.meta.lock().unwrap().get(currency).cloned())
        }

        async fn increment_request_count(
            &self,
            currency: &CurrencyCode,
        ) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Database("db offline".into()));
            }
            self.meta
                .lock()
                .unwrap()
                .entry(currency.clone())
                .or_insert_with(|| CurrencyMeta::fallback(currency.clone()))
                .request_count += 1;
            Ok(())
        }

        async fn list_currencies(
            &self,
            order: PopularityOrder,
        ) -> Result<Vec<CurrencyMeta>, StoreError> {
            if self.fail {
                return Err(StoreError::Database("db offline".into()));
            }
            let mut metas: Vec<CurrencyMeta> = self.meta.lock().unwrap().values().cloned().collect();
            metas.sort_by_key(|m| m.request_count);
            if order == PopularityOrder::MostRequestedFirst {
                metas.reverse();
            }
            Ok(metas)
        }

        async fn upsert_currency_meta(&self, meta: &CurrencyMeta) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Database("db offline".into()));
            }
            let mut table = self.meta.lock().unwrap();
            match table.get_mut(&meta.code) {
                Some(existing) => {
                    existing.display_name = meta.display_name.clone();
                    existing.scale = meta.scale;
                }
                None => {
                    table.insert(meta.code.clone(), meta.clone());
                }
            }
            Ok(())
        }
    }

    /// Scripted remote source: known codes answer a rate, unknown codes are
    /// rejected with a 404, and `unreachable()` drops every request.
    pub struct MockSource {
        rates: HashMap<String, f64>,
        currencies: Vec<CurrencyListing>,
        unreachable: bool,
        calls: AtomicUsize,
    }

    impl MockSource {
        pub fn with_rate(currency: &str, rate: f64) -> Self {
            let mut rates = HashMap::new();
            rates.insert(currency.to_string(), rate);
            Self {
                rates,
                currencies: Vec::new(),
                unreachable: false,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn rejecting() -> Self {
            Self {
                rates: HashMap::new(),
                currencies: Vec::new(),
                unreachable: false,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn unreachable() -> Self {
            Self {
                rates: HashMap::new(),
                currencies: Vec::new(),
                unreachable: true,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_currencies(mut self, currencies: Vec<CurrencyListing>) -> Self {
            self.currencies = currencies;
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for MockSource {
        async fn fetch_rate(
            &self,
            currency: &CurrencyCode,
            _date: NaiveDate,
        ) -> Result<f64, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.unreachable {
                return Err(SourceError::RemoteUnreachable("connection refused".into()));
            }
            match self.rates.get(currency.as_str()) {
                Some(rate) => Ok(*rate),
                None => Err(SourceError::RemoteRejected { status: 404 }),
            }
        }

        async fn fetch_currencies(&self) -> Result<Vec<CurrencyListing>, SourceError> {
            if self.unreachable {
                return Err(SourceError::RemoteUnreachable("connection refused".into()));
            }
            Ok(self.currencies.clone())
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Resolution order
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_cache_hit_short_circuits() {
        let cache = MockCache::new();
        cache.seed(&code("USD"), date("2024-12-12"), 3.55);
        let resolver = RateResolver::new(cache, MockStore::new(), MockSource::rejecting());

        let resolved = resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap();

        assert_eq!(resolved.rate, 3.55);
        assert_eq!(resolved.origin, RateOrigin::Cache);
        assert_eq!(resolver.store().rate_lookups(), 0, "store must not be consulted");
        assert_eq!(resolver.source().calls(), 0, "remote must not be consulted");
    }

    #[tokio::test]
    async fn test_cache_hit_still_counts_the_request() {
        let cache = MockCache::new();
        cache.seed(&code("USD"), date("2024-12-12"), 3.55);
        let resolver = RateResolver::new(cache, MockStore::new(), MockSource::rejecting());

        resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap();

        assert_eq!(resolver.store().request_count(&code("USD")), 1);
    }

    #[tokio::test]
    async fn test_store_hit_backfills_cache() {
        let store = MockStore::new();
        store.seed_rate(&code("USD"), date("2024-12-12"), 3.40);
        let resolver = RateResolver::new(MockCache::new(), store, MockSource::rejecting());

        let resolved = resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap();

        assert_eq!(resolved.rate, 3.40);
        assert_eq!(resolved.origin, RateOrigin::Store);
        assert_eq!(resolver.source().calls(), 0);
        assert_eq!(
            resolver.cache().rate(&code("USD"), date("2024-12-12")),
            Some(3.40),
            "store hit must backfill the cache"
        );

        // The backfilled value now answers without another store lookup.
        let again = resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap();
        assert_eq!(again.origin, RateOrigin::Cache);
        assert_eq!(resolver.store().rate_lookups(), 1);
    }

    #[tokio::test]
    async fn test_full_miss_fetches_persists_and_backfills() {
        let resolver = RateResolver::new(
            MockCache::new(),
            MockStore::new(),
            MockSource::with_rate("USD", 3.55),
        );

        let resolved = resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap();

        assert_eq!(resolved.rate, 3.55);
        assert_eq!(resolved.origin, RateOrigin::Remote);
        assert_eq!(resolver.store().rate(&code("USD"), date("2024-12-12")), Some(3.55));
        assert_eq!(resolver.cache().rate(&code("USD"), date("2024-12-12")), Some(3.55));

        // Subsequent resolution is served by the cache; one remote call total.
        let again = resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap();
        assert_eq!(again.rate, 3.55);
        assert_eq!(again.origin, RateOrigin::Cache);
        assert_eq!(resolver.source().calls(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Remote failures
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_remote_rejection_writes_nothing() {
        let resolver =
            RateResolver::new(MockCache::new(), MockStore::new(), MockSource::rejecting());

        let err = resolver.resolve(&code("XYZ"), date("2024-12-12")).await.unwrap_err();

        assert!(matches!(
            err.reason(),
            SourceError::RemoteRejected { status: 404 }
        ));
        assert_eq!(resolver.store().rate_count(), 0, "no store row on failure");
        assert_eq!(resolver.cache().len(), 0, "no cache entry on failure");
        // The attempt still counted toward popularity.
        assert_eq!(resolver.store().request_count(&code("XYZ")), 1);
    }

    #[tokio::test]
    async fn test_remote_unreachable_is_reported() {
        let resolver =
            RateResolver::new(MockCache::new(), MockStore::new(), MockSource::unreachable());

        let err = resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap_err();

        assert!(matches!(err.reason(), SourceError::RemoteUnreachable(_)));
        let ResolveError::Unavailable { currency, .. } = &err;
        assert_eq!(currency.as_str(), "USD");
    }

    #[tokio::test]
    async fn test_non_positive_remote_rate_is_malformed() {
        let resolver = RateResolver::new(
            MockCache::new(),
            MockStore::new(),
            MockSource::with_rate("USD", 0.0),
        );

        let err = resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap_err();

        assert!(matches!(err.reason(), SourceError::MalformedResponse(_)));
        assert_eq!(resolver.store().rate_count(), 0);
        assert_eq!(resolver.cache().len(), 0);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Infrastructure degradation
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_store_failure_degrades_to_remote() {
        let resolver = RateResolver::new(
            MockCache::new(),
            MockStore::failing(),
            MockSource::with_rate("USD", 3.55),
        );

        let resolved = resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap();

        assert_eq!(resolved.rate, 3.55);
        assert_eq!(resolved.origin, RateOrigin::Remote);
        // Metadata was unreadable too, so formatting fell back to the code.
        assert_eq!(resolved.display_name, "USD");
        assert_eq!(resolved.scale, 1);
        // The value still reached the cache.
        assert_eq!(resolver.cache().rate(&code("USD"), date("2024-12-12")), Some(3.55));
    }

    #[tokio::test]
    async fn test_cache_failure_degrades_to_store() {
        let store = MockStore::new();
        store.seed_rate(&code("USD"), date("2024-12-12"), 3.40);
        let resolver = RateResolver::new(MockCache::failing(), store, MockSource::rejecting());

        let resolved = resolver.resolve(&code("USD"), date("2024-12-12")).await.unwrap();

        assert_eq!(resolved.rate, 3.40);
        assert_eq!(resolved.origin, RateOrigin::Store);
        assert_eq!(resolver.source().calls(), 0);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Formatting
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_formats_through_metadata() {
        let store = MockStore::new();
        store.seed_rate(&code("RUB"), date("2024-12-12"), 3.59);
        store.seed_meta(CurrencyMeta::new(code("RUB"), "Russian Ruble", 100));
        let resolver = RateResolver::new(MockCache::new(), store, MockSource::rejecting());

        let resolved = resolver.resolve(&code("RUB"), date("2024-12-12")).await.unwrap();

        assert_eq!(resolved.display_name, "Russian Ruble");
        assert_eq!(resolved.scale, 100);
        assert_eq!(resolved.to_string(), "3.59 per 100 units of Russian Ruble");
    }

    #[tokio::test]
    async fn test_missing_metadata_falls_back_to_code() {
        let cache = MockCache::new();
        cache.seed(&code("GEL"), date("2024-12-12"), 1.15);
        // A failing store cannot even record the request counter, so no
        // fallback row appears - metadata is simply absent.
        let resolver = RateResolver::new(cache, MockStore::failing(), MockSource::rejecting());

        let resolved = resolver.resolve(&code("GEL"), date("2024-12-12")).await.unwrap();

        assert_eq!(resolved.display_name, "GEL");
        assert_eq!(resolved.scale, 1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Listing, refresh, reference sync
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_currencies_orders_by_popularity() {
        let store = MockStore::new();
        store.seed_meta(CurrencyMeta {
            code: code("USD"),
            display_name: "US Dollar".into(),
            scale: 1,
            request_count: 5,
        });
        store.seed_meta(CurrencyMeta {
            code: code("EUR"),
            display_name: "Euro".into(),
            scale: 1,
            request_count: 2,
        });
        let resolver = RateResolver::new(MockCache::new(), store, MockSource::rejecting());

        let listed = resolver.list_currencies(PopularityOrder::LeastRequestedFirst).await;
        let codes: Vec<&str> = listed.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["EUR", "USD"]);

        let listed = resolver.list_currencies(PopularityOrder::MostRequestedFirst).await;
        let codes: Vec<&str> = listed.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["USD", "EUR"]);
    }

    #[tokio::test]
    async fn test_list_currencies_degrades_to_empty() {
        let resolver = RateResolver::new(
            MockCache::new(),
            MockStore::failing(),
            MockSource::rejecting(),
        );

        let listed = resolver.list_currencies(PopularityOrder::default()).await;
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_daily_rates_is_idempotent() {
        let today = date("2024-12-12");
        let resolver = RateResolver::new(
            MockCache::new(),
            MockStore::new(),
            MockSource::with_rate("USD", 3.55),
        );
        let currencies = vec![code("USD")];

        let first = resolver.refresh_daily_rates(&currencies, today).await;
        let second = resolver.refresh_daily_rates(&currencies, today).await;

        assert_eq!(first.refreshed, 1);
        assert_eq!(second.refreshed, 1);
        assert_eq!(resolver.store().rate_count(), 1, "no duplicate rows");
        assert_eq!(resolver.store().rate(&code("USD"), today), Some(3.55));
        // The second run was answered by the cache backfill of the first.
        assert_eq!(resolver.source().calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_continues_past_failures() {
        let today = date("2024-12-12");
        let resolver = RateResolver::new(
            MockCache::new(),
            MockStore::new(),
            MockSource::with_rate("USD", 3.55),
        );
        let currencies = vec![code("XYZ"), code("USD")];

        let summary = resolver.refresh_daily_rates(&currencies, today).await;

        assert_eq!(summary.refreshed, 1);
        assert_eq!(summary.failed, vec![code("XYZ")]);
        assert_eq!(resolver.store().rate(&code("USD"), today), Some(3.55));
    }

    #[tokio::test]
    async fn test_sync_currency_reference_preserves_counters() {
        let store = MockStore::new();
        store.seed_meta(CurrencyMeta {
            code: code("USD"),
            display_name: "USD".into(),
            scale: 1,
            request_count: 7,
        });
        let source = MockSource::rejecting().with_currencies(vec![
            CurrencyListing {
                code: code("USD"),
                display_name: "US Dollar".into(),
                scale: 1,
            },
            CurrencyListing {
                code: code("RUB"),
                display_name: "Russian Ruble".into(),
                scale: 100,
            },
        ]);
        let resolver = RateResolver::new(MockCache::new(), store, source);

        let applied = resolver.sync_currency_reference().await.unwrap();

        assert_eq!(applied, 2);
        assert_eq!(resolver.store().request_count(&code("USD")), 7);
        let listed = resolver.list_currencies(PopularityOrder::default()).await;
        let usd = listed.iter().find(|l| l.code.as_str() == "USD").unwrap();
        assert_eq!(usd.display_name, "US Dollar");
    }

    #[tokio::test]
    async fn test_sync_currency_reference_surfaces_source_failure() {
        let resolver = RateResolver::new(
            MockCache::new(),
            MockStore::new(),
            MockSource::unreachable(),
        );

        let err = resolver.sync_currency_reference().await.unwrap_err();
        assert!(matches!(err, SourceError::RemoteUnreachable(_)));
    }
}
