//! SQLite store adapter.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use rates_types::{
    CurrencyCode, CurrencyMeta, PopularityOrder, RateEntry, RateStore, StoreError,
};

use crate::types::{DbCurrencyMeta, DbRateValue};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Store
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite store implementation.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Creates a new SQLite store with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        // Run migration from migration file
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RateStore for SqliteStore {
    async fn get_rate(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Option<f64>, StoreError> {
        let date_str = date.format(DATE_FORMAT).to_string();

        let row: Option<DbRateValue> =
            sqlx::query_as(r#"SELECT rate FROM rates WHERE currency_code = ? AND date = ?"#)
                .bind(currency.as_str())
                .bind(&date_str)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(row.map(|r| r.rate))
    }

    async fn upsert_rate(&self, entry: &RateEntry) -> Result<(), StoreError> {
        let date_str = entry.date.format(DATE_FORMAT).to_string();
        let fetched_at_str = entry.fetched_at.to_rfc3339();

        sqlx::query(
            r#"INSERT INTO rates (currency_code, date, rate, fetched_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(currency_code, date)
               DO UPDATE SET rate = excluded.rate, fetched_at = excluded.fetched_at"#,
        )
        .bind(entry.currency.as_str())
        .bind(&date_str)
        .bind(entry.rate)
        .bind(&fetched_at_str)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_currency_meta(
        &self,
        currency: &CurrencyCode,
    ) -> Result<Option<CurrencyMeta>, StoreError> {
        let row: Option<DbCurrencyMeta> = sqlx::query_as(
            r#"SELECT currency_code, display_name, scale, request_count
               FROM currency_meta WHERE currency_code = ?"#,
        )
        .bind(currency.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(DbCurrencyMeta::into_domain).transpose()
    }

    async fn increment_request_count(&self, currency: &CurrencyCode) -> Result<(), StoreError> {
        // Single statement, so concurrent increments never lose an update.
        // A fresh row starts with the raw code as its display name until the
        // reference sync fills in the real one.
        sqlx::query(
            r#"INSERT INTO currency_meta (currency_code, display_name, scale, request_count)
               VALUES (?, ?, 1, 1)
               ON CONFLICT(currency_code)
               DO UPDATE SET request_count = request_count + 1"#,
        )
        .bind(currency.as_str())
        .bind(currency.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_currencies(
        &self,
        order: PopularityOrder,
    ) -> Result<Vec<CurrencyMeta>, StoreError> {
        let sql = match order {
            PopularityOrder::LeastRequestedFirst => {
                r#"SELECT currency_code, display_name, scale, request_count
                   FROM currency_meta ORDER BY request_count ASC, currency_code ASC"#
            }
            PopularityOrder::MostRequestedFirst => {
                r#"SELECT currency_code, display_name, scale, request_count
                   FROM currency_meta ORDER BY request_count DESC, currency_code ASC"#
            }
        };

        let rows: Vec<DbCurrencyMeta> = sqlx::query_as(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(DbCurrencyMeta::into_domain).collect()
    }

    async fn upsert_currency_meta(&self, meta: &CurrencyMeta) -> Result<(), StoreError> {
        // Reference updates never touch the popularity counter.
        sqlx::query(
            r#"INSERT INTO currency_meta (currency_code, display_name, scale, request_count)
               VALUES (?, ?, ?, 0)
               ON CONFLICT(currency_code)
               DO UPDATE SET display_name = excluded.display_name, scale = excluded.scale"#,
        )
        .bind(meta.code.as_str())
        .bind(&meta.display_name)
        .bind(i64::from(meta.scale))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}
