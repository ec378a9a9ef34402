//! Database row structs and their domain conversions.

use sqlx::FromRow;

use rates_types::{CurrencyCode, CurrencyMeta, StoreError};

/// Rate-only row for point lookups.
#[derive(FromRow)]
pub struct DbRateValue {
    pub rate: f64,
}

/// Currency metadata row.
#[derive(FromRow)]
pub struct DbCurrencyMeta {
    pub currency_code: String,
    pub display_name: String,
    pub scale: i64,
    pub request_count: i64,
}

impl DbCurrencyMeta {
    /// Convert database row to domain CurrencyMeta.
    pub fn into_domain(self) -> Result<CurrencyMeta, StoreError> {
        let code = CurrencyCode::new(self.currency_code)?;
        Ok(CurrencyMeta {
            code,
            display_name: self.display_name,
            scale: self.scale.clamp(1, i64::from(u32::MAX)) as u32,
            request_count: self.request_count,
        })
    }
}
