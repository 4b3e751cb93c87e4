//! Public product and review routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use vegi_shop_core::ProductId;
use vegi_shop_db::{
    ProductDetail, ProductRepository, ProductSummary, RepositoryError, Review, ReviewRepository,
};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, json_int};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Longest review comment accepted.
const MAX_COMMENT_LENGTH: usize = 2000;

/// All products with category name and images, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductSummary>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// One product with images, average rating and review count.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductDetail>> {
    ProductRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Reviews of a product, newest first.
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Vec<Review>>> {
    if !ProductRepository::new(state.pool()).exists(id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    let reviews = ReviewRepository::new(state.pool()).list_for_product(id).await?;
    Ok(Json(reviews))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: Option<serde_json::Value>,
    pub comment: Option<String>,
}

/// A validated review submission.
#[derive(Debug, PartialEq, Eq)]
struct ReviewInput {
    rating: i16,
    comment: Option<String>,
}

impl TryFrom<ReviewRequest> for ReviewInput {
    type Error = AppError;

    fn try_from(req: ReviewRequest) -> Result<Self> {
        let rating = req
            .rating
            .as_ref()
            .and_then(|v| json_int(v, true))
            .filter(|r| (1..=5).contains(r))
            .and_then(|r| i16::try_from(r).ok())
            .ok_or_else(|| AppError::BadRequest("Rating must be between 1 and 5".to_string()))?;

        let comment = req
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if comment
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_COMMENT_LENGTH)
        {
            return Err(AppError::BadRequest(format!(
                "Comment must be at most {MAX_COMMENT_LENGTH} characters"
            )));
        }

        Ok(Self { rating, comment })
    }
}

/// Post a review as the logged-in user.
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn create_review(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let input = ReviewInput::try_from(body)?;

    if !ProductRepository::new(state.pool()).exists(id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    let review = ReviewRepository::new(state.pool())
        .create(id, user.id, input.rating, input.comment.as_deref())
        .await
        .map_err(|e| match e {
            // Deleted between the existence check and the insert
            RepositoryError::Conflict(msg) => AppError::NotFound(msg),
            other => AppError::Database(other),
        })?;

    tracing::info!(product_id = %id, rating = review.rating, "Review posted");
    Ok((StatusCode::CREATED, Json(review)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(rating: serde_json::Value, comment: Option<&str>) -> ReviewRequest {
        ReviewRequest {
            rating: Some(rating),
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn test_review_rating_bounds() {
        for bad in [json!(0), json!(6), json!(4.5), json!("x"), json!(null)] {
            let err = ReviewInput::try_from(request(bad, None)).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if m == "Rating must be between 1 and 5"));
        }
        let input = ReviewInput::try_from(request(json!(5), Some("  Crisp  "))).unwrap();
        assert_eq!(
            input,
            ReviewInput {
                rating: 5,
                comment: Some("Crisp".to_string())
            }
        );
    }

    #[test]
    fn test_review_missing_rating() {
        let req = ReviewRequest {
            rating: None,
            comment: Some("Great".to_string()),
        };
        assert!(ReviewInput::try_from(req).is_err());
    }

    #[test]
    fn test_review_blank_comment_is_dropped() {
        let input = ReviewInput::try_from(request(json!("3"), Some("   "))).unwrap();
        assert_eq!(input.comment, None);
    }

    #[test]
    fn test_review_comment_length_limit() {
        let long = "a".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(ReviewInput::try_from(request(json!(4), Some(&long))).is_err());
    }
}
