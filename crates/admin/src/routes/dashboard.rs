//! Dashboard counters.

use axum::{Json, extract::State};
use tracing::instrument;

use vegi_shop_db::{DashboardRepository, DashboardStats};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[instrument(skip_all)]
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardStats>> {
    let stats = DashboardRepository::new(state.pool()).stats().await?;
    Ok(Json(stats))
}
