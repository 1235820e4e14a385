//! Opal Store - `PostgreSQL` persistence.
//!
//! [`PgStore`] implements every storage trait from `opal_core::store` over a
//! single connection pool.
//!
//! # Tables (schema `opal`)
//!
//! - `product` - Catalog products
//! - `category` - Two-level category tree
//! - `customer_order` - Placed orders (`order_number` is unique)
//! - `store_settings` - Settings singleton (`id = 1`)
//!
//! # Migrations
//!
//! Migrations live in `crates/store/migrations/` and run via:
//! ```bash
//! opal migrate
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod categories;
mod orders;
mod products;
mod settings;

use std::time::Duration;

use opal_core::store::StoreError;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url.expose_secret()).await
}

/// Create a pool that connects on first use.
///
/// Lets a binary start while the database is down; requests then fail with
/// [`StoreError::Unavailable`] until it comes back.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL cannot be parsed.
pub fn create_lazy_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url.expose_secret())
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns the migration error if any migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// `PostgreSQL` implementation of the storage traits.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a sqlx error onto the storage error taxonomy.
pub(crate) fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(db_err.message().to_owned())
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_) => StoreError::Unavailable(e.to_string()),
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::DataCorruption(e.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

/// Parse a stored enum column, reporting failures as corruption.
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| StoreError::DataCorruption(format!("invalid {column} in database: {e}")))
}

#[cfg(test)]
mod tests {
    use opal_core::OrderStatus;

    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(store_error(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(store_error(sqlx::Error::PoolClosed).is_unavailable());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }

    #[test]
    fn test_parse_column_reports_corruption() {
        assert_eq!(
            parse_column::<OrderStatus>("status", "shipped").ok(),
            Some(OrderStatus::Shipped)
        );
        assert!(matches!(
            parse_column::<OrderStatus>("status", "lost"),
            Err(StoreError::DataCorruption(_))
        ));
    }
}
