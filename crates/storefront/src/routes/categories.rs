//! Public category routes.

use axum::{Json, extract::State};
use tracing::instrument;

use vegi_shop_core::CategoryId;
use vegi_shop_db::{Category, CategoryRepository};

use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::state::AppState;

/// All categories, by name.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}
