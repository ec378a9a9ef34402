//! # Rates Types
//!
//! Domain types and port traits for the rate resolution service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (CurrencyCode, RateEntry, CurrencyMeta)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and pipeline error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{CurrencyCode, CurrencyMeta, RateEntry, parse_rate_date};
pub use dto::{CurrencyListing, PopularityOrder, RateOrigin, RefreshSummary, ResolvedRate};
pub use error::{CacheError, DomainError, ResolveError, SourceError, StoreError};
pub use ports::{RateCache, RateSource, RateStore};
