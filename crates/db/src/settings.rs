//! Database URL resolution.
//!
//! Lookup order:
//! 1. `<BINARY>_DATABASE_URL` (e.g. `STOREFRONT_DATABASE_URL`)
//! 2. `DATABASE_URL`
//! 3. Composed from `POSTGRES_HOST`, `POSTGRES_PORT` (default 5432),
//!    `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_DATABASE` and
//!    `POSTGRES_SSL` (`true`/`1` adds `sslmode=require`)

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatabaseUrlError {
    #[error("Missing environment variable: {0} (or DATABASE_URL / POSTGRES_HOST)")]
    NotConfigured(String),
    #[error("POSTGRES_HOST is set but {0} is missing")]
    Incomplete(&'static str),
    #[error("Invalid environment variable POSTGRES_PORT: {0}")]
    InvalidPort(String),
}

/// Resolve the database URL from the process environment.
///
/// # Errors
///
/// Returns an error if no source is configured or the `POSTGRES_*` set is
/// incomplete.
pub fn database_url_from_env(primary_key: &str) -> Result<SecretString, DatabaseUrlError> {
    resolve(primary_key, |key| {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    })
}

fn resolve(
    primary_key: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, DatabaseUrlError> {
    if let Some(url) = lookup(primary_key) {
        return Ok(SecretString::from(url));
    }
    if let Some(url) = lookup("DATABASE_URL") {
        return Ok(SecretString::from(url));
    }

    let Some(host) = lookup("POSTGRES_HOST") else {
        return Err(DatabaseUrlError::NotConfigured(primary_key.to_owned()));
    };
    let port = match lookup("POSTGRES_PORT") {
        Some(p) => p
            .parse::<u16>()
            .map_err(|e| DatabaseUrlError::InvalidPort(e.to_string()))?,
        None => 5432,
    };
    let user = lookup("POSTGRES_USER").ok_or(DatabaseUrlError::Incomplete("POSTGRES_USER"))?;
    let database =
        lookup("POSTGRES_DATABASE").ok_or(DatabaseUrlError::Incomplete("POSTGRES_DATABASE"))?;
    let password = lookup("POSTGRES_PASSWORD").unwrap_or_default();
    let ssl = lookup("POSTGRES_SSL").is_some_and(|v| matches!(v.as_str(), "true" | "1"));

    let credentials = if password.is_empty() {
        urlencoding::encode(&user).into_owned()
    } else {
        format!(
            "{}:{}",
            urlencoding::encode(&user),
            urlencoding::encode(&password)
        )
    };
    let mut url = format!("postgres://{credentials}@{host}:{port}/{database}");
    if ssl {
        url.push_str("?sslmode=require");
    }
    Ok(SecretString::from(url))
}
