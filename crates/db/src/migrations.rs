//! Embedded schema migrations.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `crates/db/migrations/` named
//!    `YYYYMMDDNNNNNN_description.sql`
//! 2. Never modify an applied migration; add a new one instead

use sqlx::PgPool;
use tracing::info;

/// Migrations from `crates/db/migrations`, embedded at compile time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Run all pending migrations.
///
/// Idempotent: applied migrations are recorded in `_sqlx_migrations` and
/// skipped on later runs.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or an applied migration's
/// checksum no longer matches.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(
        available = MIGRATOR.migrations.len(),
        "Checking for pending migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}
