//! Command implementations.

pub mod admin;
pub mod backup;
pub mod import;
pub mod migrate;

use opal_store::PgStore;
use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by the database-backed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] opal_core::store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Refused(String),
}

/// Read `DATABASE_URL`, loading `.env` first.
pub(crate) fn database_url() -> Result<SecretString, CommandError> {
    let _ = dotenvy::dotenv();
    std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DATABASE_URL"))
}

/// Connect eagerly so a bad URL fails before any work starts.
pub(crate) async fn connect() -> Result<PgStore, CommandError> {
    let pool = opal_store::create_pool(&database_url()?).await?;
    Ok(PgStore::new(pool))
}
