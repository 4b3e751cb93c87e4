//! IconScout v3 search proxy.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

const SEARCH_URL: &str = "https://api.iconscout.com/v3/search";
const PER_PAGE: &str = "32";

#[derive(Debug, Error)]
pub enum IconScoutError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid search URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("search returned {0}")]
    Status(reqwest::StatusCode),
}

fn search_url(query: &str) -> Result<url::Url, url::ParseError> {
    url::Url::parse_with_params(
        SEARCH_URL,
        &[
            ("query", query),
            ("product_type", "icons"),
            ("price", "free"),
            ("per_page", PER_PAGE),
        ],
    )
}

#[derive(Clone)]
pub struct IconScoutClient {
    client: Client,
    api_key: SecretString,
}

impl std::fmt::Debug for IconScoutClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconScoutClient")
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl IconScoutClient {
    #[must_use]
    pub const fn new(client: Client, api_key: SecretString) -> Self {
        Self { client, api_key }
    }

    /// Free icons matching `query`. The response body is passed through
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if IconScout is unreachable or answers non-2xx.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<serde_json::Value, IconScoutError> {
        let response = self
            .client
            .get(search_url(query)?)
            .header("Client-ID", self.api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IconScoutError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let url = search_url("leafy greens & herbs").unwrap();
        assert_eq!(url.host_str(), Some("api.iconscout.com"));
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["query"], "leafy greens & herbs");
        assert_eq!(params["product_type"], "icons");
        assert_eq!(params["price"], "free");
        assert_eq!(params["per_page"], "32");
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = IconScoutClient::new(Client::new(), SecretString::from("ics-9f3k2m"));
        assert!(!format!("{client:?}").contains("ics-9f3k2m"));
    }
}
