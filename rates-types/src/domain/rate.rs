//! Exchange rate values and boundary date parsing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::CurrencyCode;
use crate::error::DomainError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` calendar date.
///
/// Malformed dates (including impossible ones like `2024-13-40`) fail here,
/// at the input boundary, before any cache, store, or network access.
pub fn parse_rate_date(input: &str) -> Result<NaiveDate, DomainError> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| DomainError::InvalidDate(input.to_string()))
}

/// One authoritative exchange rate: what `scale` units of `currency` cost
/// in the base currency on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    pub rate: f64,
    pub fetched_at: DateTime<Utc>,
}

impl RateEntry {
    /// Creates a rate entry, rejecting non-positive or non-finite rates.
    pub fn new(
        currency: CurrencyCode,
        date: NaiveDate,
        rate: f64,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DomainError::NonPositiveRate(rate));
        }
        Ok(Self {
            currency,
            date,
            rate,
            fetched_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    #[test]
    fn test_parse_rate_date() {
        let date = parse_rate_date("2024-12-12").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 12).unwrap());
    }

    #[test]
    fn test_parse_rate_date_trims() {
        assert!(parse_rate_date(" 2024-12-12 ").is_ok());
    }

    #[test]
    fn test_parse_rate_date_rejects_malformed() {
        assert!(matches!(
            parse_rate_date("2024-13-40"),
            Err(DomainError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_rate_date("12/12/2024"),
            Err(DomainError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_rate_date("not a date"),
            Err(DomainError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_rate_entry_creation() {
        let date = parse_rate_date("2024-12-12").unwrap();
        let entry = RateEntry::new(usd(), date, 3.55, Utc::now()).unwrap();
        assert_eq!(entry.rate, 3.55);
    }

    #[test]
    fn test_rate_entry_rejects_non_positive() {
        let date = parse_rate_date("2024-12-12").unwrap();
        assert!(matches!(
            RateEntry::new(usd(), date, 0.0, Utc::now()),
            Err(DomainError::NonPositiveRate(_))
        ));
        assert!(matches!(
            RateEntry::new(usd(), date, -1.2, Utc::now()),
            Err(DomainError::NonPositiveRate(_))
        ));
        assert!(matches!(
            RateEntry::new(usd(), date, f64::NAN, Utc::now()),
            Err(DomainError::NonPositiveRate(_))
        ));
    }
}
