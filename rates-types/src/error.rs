//! Error types for the rate resolution pipeline.
//!
//! The taxonomy follows the propagation policy: infrastructure failures
//! (`CacheError`, `StoreError`) are absorbed by the resolver and degrade to
//! a miss; only remote-source failures reach the caller, wrapped in
//! `ResolveError`. Nothing here is fatal to the process.

use chrono::NaiveDate;

use crate::domain::CurrencyCode;

/// Input validation errors, rejected at the boundary before the resolver.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    #[error("Invalid date (expected YYYY-MM-DD): {0:?}")]
    InvalidDate(String),

    #[error("Rate must be a positive number, got {0}")]
    NonPositiveRate(f64),
}

/// Cache adapter failures. Always downgraded to a miss and logged.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache snapshot corrupt: {0}")]
    Corrupt(String),
}

/// Persistent store failures. Always downgraded to a miss and logged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),
}

/// Remote rate source failures, classified per cause.
///
/// Malformed dates cannot reach the source adapter - they are rejected as
/// `DomainError::InvalidDate` at the string boundary, so the wire call only
/// ever sees well-formed calendar dates.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The remote answered with a non-success status (unknown currency,
    /// future date, ...).
    #[error("Remote rejected the request with status {status}")]
    RemoteRejected { status: u16 },

    /// Connection failure or bounded-timeout expiry.
    #[error("Remote unreachable: {0}")]
    RemoteUnreachable(String),

    /// Success status but the expected rate field was absent or unusable.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// The only failure surfaced to resolver callers: no rate could be produced
/// for this request. The classified reason is available through the error
/// source chain for logging; end users only see the absence.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("rate unavailable for {currency} on {date}")]
    Unavailable {
        currency: CurrencyCode,
        date: NaiveDate,
        #[source]
        reason: SourceError,
    },
}

impl ResolveError {
    pub fn unavailable(currency: CurrencyCode, date: NaiveDate, reason: SourceError) -> Self {
        Self::Unavailable {
            currency,
            date,
            reason,
        }
    }

    /// The classified remote failure behind this absence.
    pub fn reason(&self) -> &SourceError {
        match self {
            Self::Unavailable { reason, .. } => reason,
        }
    }
}
