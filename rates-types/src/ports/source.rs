//! Remote rate source port trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::CurrencyCode;
use crate::dto::CurrencyListing;
use crate::error::SourceError;

/// Port trait for the remote official-rate provider.
///
/// One request per call. Retries, if any, are a resolver-level policy
/// (currently: none - a single attempt per resolution). Implementations
/// must carry a bounded timeout, surfaced as `RemoteUnreachable` on expiry.
#[async_trait]
pub trait RateSource: Send + Sync + 'static {
    /// Fetches the official rate for an exact date. A failure is a typed
    /// classification, never a zero or invented rate.
    async fn fetch_rate(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<f64, SourceError>;

    /// Fetches the remote currency reference (code, display name, scale).
    async fn fetch_currencies(&self) -> Result<Vec<CurrencyListing>, SourceError>;
}
