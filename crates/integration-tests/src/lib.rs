//! Integration tests for Vegi Shop.
//!
//! The library half holds typed HTTP clients for both APIs and
//! [`CartContext`], the client-side optimistic cart. The `tests/` directory
//! drives them against running servers.
//!
//! # Running Tests
//!
//! ```bash
//! # Database, schema and demo catalog
//! cargo run -p vegi-shop-cli -- migrate
//! cargo run -p vegi-shop-cli -- seed data/seed.yaml
//! cargo run -p vegi-shop-cli -- admin create -e admin@example.com -p 'admin-password'
//!
//! # Both servers
//! cargo run -p vegi-shop-storefront &
//! cargo run -p vegi-shop-admin &
//!
//! # Integration tests are ignored by default
//! cargo test -p vegi-shop-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - default `http://localhost:3001`
//! - `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD` - admin login for admin tests

#![cfg_attr(not(test), forbid(unsafe_code))]

mod admin;
mod cart_context;
mod storefront;

pub use admin::{AdminClient, ProductForm};
pub use cart_context::CartContext;
pub use storefront::StorefrontClient;

use reqwest::{Response, StatusCode};
use thiserror::Error;

/// Errors returned by the API clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS or body decoding failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Status code of a rejected request.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided error message of a rejected request.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Storefront base URL, without trailing slash.
#[must_use]
pub fn storefront_base_url() -> String {
    env_url("STOREFRONT_BASE_URL", "http://localhost:3000")
}

/// Admin base URL, without trailing slash.
#[must_use]
pub fn admin_base_url() -> String {
    env_url("ADMIN_BASE_URL", "http://localhost:3001")
}

fn env_url(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
        .trim_end_matches('/')
        .to_owned()
}

/// A `reqwest` client that keeps the session cookie between requests.
fn session_client() -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder().cookie_store(true).build()?)
}

/// Pass success responses through; turn anything else into
/// [`ClientError::Status`] carrying the `{"error": ...}` message.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status,
        message: error_message(&body),
    })
}

/// Extract the message from an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.to_owned())
}
