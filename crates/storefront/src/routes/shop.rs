//! Shop listing: `GET /api/shop`.

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use vegi_shop_core::shop::{ShopParams, ShopQuery};
use vegi_shop_db::{ShopListing, ShopRepository};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Filtered, sorted, paginated products with category facets and the
/// global price range.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ShopParams>,
) -> Result<Json<ShopListing>> {
    let query = ShopQuery::try_from(params).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let listing = ShopRepository::new(state.pool()).list(&query).await?;

    tracing::debug!(
        total = listing.pagination.total,
        page = query.page,
        returned = listing.products.len(),
        "Shop listing"
    );
    Ok(Json(listing))
}
