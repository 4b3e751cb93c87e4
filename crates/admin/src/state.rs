//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::{IconScoutClient, StableDiffusionClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    stable_diffusion: StableDiffusionClient,
    iconscout: Option<IconScoutClient>,
}

impl AppState {
    /// Build the state. Outbound HTTP clients share one connection pool.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let http = reqwest::Client::new();
        let stable_diffusion =
            StableDiffusionClient::new(http.clone(), &config.stable_diffusion_url);
        let iconscout = config
            .iconscout_api_key
            .clone()
            .map(|key| IconScoutClient::new(http, key));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                stable_diffusion,
                iconscout,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn stable_diffusion(&self) -> &StableDiffusionClient {
        &self.inner.stable_diffusion
    }

    /// IconScout client, if `ICONSCOUT_API_KEY` is set.
    #[must_use]
    pub fn iconscout(&self) -> Option<&IconScoutClient> {
        self.inner.iconscout.as_ref()
    }
}
