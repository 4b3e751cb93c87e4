//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use sqlx::PgPool;
use vegi_shop_db::DatabaseUrlError;

/// Environment key checked first for the database URL.
const DATABASE_URL_KEY: &str = "ADMIN_DATABASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] DatabaseUrlError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Load `.env`, resolve the database URL and open a pool.
///
/// # Errors
///
/// Returns `ConnectError` if no database is configured or it is unreachable.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = vegi_shop_db::database_url_from_env(DATABASE_URL_KEY)?;

    tracing::info!("Connecting to database...");
    Ok(vegi_shop_db::create_pool(&database_url).await?)
}
