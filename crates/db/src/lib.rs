//! Vegi Shop database layer.
//!
//! Both the storefront and admin binaries share one `PostgreSQL` database.
//! This crate owns the schema (embedded migrations), pool creation, and one
//! repository per aggregate.
//!
//! ## Tables
//!
//! - `users` - Customer and admin accounts (`role` distinguishes them)
//! - `categories`, `products`, `product_images` - Catalog
//! - `carts`, `cart_items` - One persisted cart per user
//! - `orders`, `order_items` - Checked-out carts with price snapshots
//! - `reviews` - Product ratings
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/db/migrations/` and run via:
//! ```bash
//! cargo run -p vegi-shop-cli -- migrate
//! ```
//!
//! # Queries
//!
//! Queries are checked at runtime (`sqlx::query_as` + `FromRow`) rather
//! than with the compile-time macros; the shop listing is assembled with
//! `QueryBuilder` because its filters are optional.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod migrations;
pub mod repositories;
pub mod settings;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use migrations::{MIGRATOR, run_migrations};
pub use repositories::*;
pub use settings::{DatabaseUrlError, database_url_from_env};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug, referenced category).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign-key violations on a write to `Conflict`.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// `SELECT 1` against the pool, used by readiness probes.
///
/// # Errors
///
/// Returns `sqlx::Error` if no connection can run the query.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
