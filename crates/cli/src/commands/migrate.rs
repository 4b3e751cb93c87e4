//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! vegi-cli migrate
//! ```
//!
//! Migrations live in `crates/db/migrations/` and are embedded in the
//! binary, so the command works from any directory.

use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `MigrationError` if the connection or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    vegi_shop_db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
