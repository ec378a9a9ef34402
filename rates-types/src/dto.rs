//! Data Transfer Objects for the collaborator-facing API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{CurrencyCode, CurrencyMeta};

/// Which layer produced a resolved rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateOrigin {
    Cache,
    Store,
    Remote,
}

/// A successfully resolved rate, ready for display.
///
/// Formatting happens strictly after resolution: only the numeric `rate`
/// ever crosses the cache/store boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    pub rate: f64,
    pub display_name: String,
    pub scale: u32,
    pub origin: RateOrigin,
}

impl ResolvedRate {
    pub fn from_meta(meta: &CurrencyMeta, date: NaiveDate, rate: f64, origin: RateOrigin) -> Self {
        Self {
            currency: meta.code.clone(),
            date,
            rate,
            display_name: meta.display_name.clone(),
            scale: meta.scale,
            origin,
        }
    }
}

impl fmt::Display for ResolvedRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} per {} units of {}",
            self.rate, self.scale, self.display_name
        )
    }
}

/// One entry of the "all currencies" listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyListing {
    pub code: CurrencyCode,
    pub display_name: String,
    pub scale: u32,
}

impl From<CurrencyMeta> for CurrencyListing {
    fn from(meta: CurrencyMeta) -> Self {
        Self {
            code: meta.code,
            display_name: meta.display_name,
            scale: meta.scale,
        }
    }
}

/// Ordering for currency listings.
///
/// Popularity ordering is a display decision, so it travels as a parameter
/// instead of being baked into a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopularityOrder {
    /// Least requested first (popular currencies at the bottom of the list).
    #[default]
    LeastRequestedFirst,
    MostRequestedFirst,
}

/// Outcome of one daily-rates refresh run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: Vec<CurrencyCode>,
}
