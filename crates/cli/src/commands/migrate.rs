//! Database migration command.
//!
//! ```bash
//! opal migrate
//! ```
//!
//! Runs the `opal-store` migrations, then creates the tower-sessions table
//! used by both the storefront cart and admin logins.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run every migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    tracing::info!("Connecting to database...");
    let store = connect().await?;

    tracing::info!("Running store migrations...");
    opal_store::migrate(store.pool()).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(store.pool().clone()).migrate().await?;

    tracing::info!("Migrations complete");
    Ok(())
}
