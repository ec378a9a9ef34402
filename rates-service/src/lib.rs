//! # Rates Service
//!
//! Application service layer for the rate resolution pipeline.
//!
//! The resolver is generic over the `RateCache`, `RateStore` and
//! `RateSource` ports, allowing different adapter implementations to be
//! injected. All callers share this single entry point - there is exactly
//! one canonical lookup algorithm.

pub mod resolver;

#[cfg(test)]
mod resolver_tests;

pub use resolver::RateResolver;
