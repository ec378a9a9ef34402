//! # Rates NBRB
//!
//! Outbound HTTP adapter for the National Bank of the Republic of Belarus
//! exrates API, implementing the `RateSource` port.
//!
//! Wire contract: `GET {base}/rates/{CODE}?parammode=2&ondate=YYYY-MM-DD`
//! answers a JSON object whose `Cur_OfficialRate` field carries the official
//! rate in BYN; `GET {base}/currencies` answers the currency reference. A
//! non-success status or an absent rate field is a failure, never a zero
//! rate.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use rates_types::{CurrencyCode, CurrencyListing, RateSource, SourceError};

/// Public NBRB exrates endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.nbrb.by/exrates";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ─────────────────────────────────────────────────────────────────────────────
// Wire payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Official-rate payload for a single currency/date.
#[derive(Debug, Deserialize)]
struct RateResponse {
    #[serde(rename = "Cur_OfficialRate")]
    official_rate: Option<f64>,
}

/// One entry of the remote currency reference.
#[derive(Debug, Deserialize)]
struct CurrencyResponse {
    #[serde(rename = "Cur_Abbreviation")]
    abbreviation: String,
    #[serde(rename = "Cur_Name")]
    name: String,
    #[serde(rename = "Cur_Scale")]
    scale: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// NBRB exrates API client.
///
/// One request per call, no retries; every request carries a bounded
/// timeout, classified as `RemoteUnreachable` on expiry.
pub struct NbrbClient {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl NbrbClient {
    /// Creates a new client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn rate_url(&self, currency: &CurrencyCode, date: NaiveDate) -> String {
        format!(
            "{}/rates/{}?parammode=2&ondate={}",
            self.base_url,
            currency,
            date.format("%Y-%m-%d")
        )
    }

    fn currencies_url(&self) -> String {
        format!("{}/currencies", self.base_url)
    }
}

impl Default for NbrbClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl RateSource for NbrbClient {
    async fn fetch_rate(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<f64, SourceError> {
        let url = self.rate_url(currency, date);

        let resp = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SourceError::RemoteUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%currency, %date, status = status.as_u16(), "rate request rejected");
            return Err(SourceError::RemoteRejected {
                status: status.as_u16(),
            });
        }

        let body: RateResponse = resp
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        let rate = body.official_rate.ok_or_else(|| {
            SourceError::MalformedResponse("missing Cur_OfficialRate field".to_string())
        })?;

        tracing::debug!(%currency, %date, rate, "official rate fetched");
        Ok(rate)
    }

    async fn fetch_currencies(&self) -> Result<Vec<CurrencyListing>, SourceError> {
        let url = self.currencies_url();

        let resp = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SourceError::RemoteUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "currency reference request rejected");
            return Err(SourceError::RemoteRejected {
                status: status.as_u16(),
            });
        }

        let body: Vec<CurrencyResponse> = resp
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        let mut listings = Vec::with_capacity(body.len());
        for item in body {
            match CurrencyCode::new(item.abbreviation.as_str()) {
                Ok(code) => listings.push(CurrencyListing {
                    code,
                    display_name: item.name,
                    scale: item.scale.max(1),
                }),
                Err(e) => tracing::warn!("skipping currency reference entry: {e}"),
            }
        }

        tracing::debug!(count = listings.len(), "currency reference fetched");
        Ok(listings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
