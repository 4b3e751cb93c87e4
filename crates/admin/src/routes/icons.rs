//! IconScout icon search.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::{ApiQuery, non_blank};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// Proxy a search. The key check comes first so a misconfigured
/// deployment is reported even for empty queries.
#[instrument(skip(state, _admin))]
pub async fn search(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<serde_json::Value>> {
    let client = state
        .iconscout()
        .ok_or_else(|| AppError::Internal("IconScout API key not configured".to_string()))?;
    let query = non_blank(params.query.as_deref())
        .ok_or_else(|| AppError::BadRequest("Query parameter is required".to_string()))?;

    Ok(Json(client.search(query).await?))
}
