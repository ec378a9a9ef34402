//! Configuration loading from environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use rates_types::CurrencyCode;

/// Currencies refreshed on a schedule when `POPULAR_CURRENCIES` is unset.
const DEFAULT_POPULAR: &str = "USD,EUR,RUB,GBP,PLN,UAH,CNY,KZT,GEL,AED";

/// Application configuration.
pub struct Config {
    pub database_url: String,
    pub nbrb_base_url: String,
    pub cache_snapshot_path: PathBuf,
    pub cache_ttl: Duration,
    pub http_timeout: Duration,
    pub popular_currencies: Vec<CurrencyCode>,
    pub refresh_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables, with defaults suited
    /// to a single-node deployment.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/rates.db?mode=rwc".to_string());

        let nbrb_base_url =
            env::var("NBRB_BASE_URL").unwrap_or_else(|_| rates_nbrb::DEFAULT_BASE_URL.to_string());

        let cache_snapshot_path: PathBuf = env::var("CACHE_SNAPSHOT_PATH")
            .unwrap_or_else(|_| "data/cache.json".to_string())
            .into();

        let cache_ttl = Duration::from_secs(parse_secs("CACHE_TTL_SECS", 30 * 60)?);
        let http_timeout = Duration::from_secs(parse_secs("HTTP_TIMEOUT_SECS", 10)?);
        let refresh_interval = Duration::from_secs(parse_secs("REFRESH_INTERVAL_SECS", 60 * 60)?);

        let popular =
            env::var("POPULAR_CURRENCIES").unwrap_or_else(|_| DEFAULT_POPULAR.to_string());
        let popular_currencies = parse_currency_list(&popular)?;

        Ok(Self {
            database_url,
            nbrb_base_url,
            cache_snapshot_path,
            cache_ttl,
            http_timeout,
            popular_currencies,
            refresh_interval,
        })
    }
}

fn parse_secs(var: &str, default: u64) -> anyhow::Result<u64> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{var} must be a number of seconds, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn parse_currency_list(raw: &str) -> anyhow::Result<Vec<CurrencyCode>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| CurrencyCode::new(s).map_err(Into::into))
        .collect()
}
