//! Currency identity and reference metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// A currency code: 3-5 uppercase ASCII letters.
///
/// The set of valid codes is open - the remote currency reference decides
/// which currencies actually exist. Parsing uppercases its input, so user
/// input like `usd` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validates and normalizes a currency code.
    pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
        let code = code.into().trim().to_ascii_uppercase();
        if !(3..=5).contains(&code.len()) || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(DomainError::InvalidCurrencyCode(code));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Reference metadata for a currency, plus its popularity counter.
///
/// Created or updated when a currency is first referenced; `request_count`
/// grows on every resolution attempt and is used purely for popularity
/// ordering in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyMeta {
    pub code: CurrencyCode,
    pub display_name: String,
    /// Units the rate is quoted per (e.g. a rate quoted per 100 JPY).
    /// A zero scale is normalized to 1.
    pub scale: u32,
    pub request_count: i64,
}

impl CurrencyMeta {
    pub fn new(code: CurrencyCode, display_name: impl Into<String>, scale: u32) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            scale: scale.max(1),
            request_count: 0,
        }
    }

    /// Placeholder metadata for a code the reference knows nothing about.
    ///
    /// Resolution must not fail solely because metadata is missing, so the
    /// raw code doubles as the display name with a scale of 1.
    pub fn fallback(code: CurrencyCode) -> Self {
        let display_name = code.as_str().to_string();
        Self {
            code,
            display_name,
            scale: 1,
            request_count: 0,
        }
    }
}
