//! Review repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use vegi_shop_core::{ProductId, ReviewId, UserId};

use crate::RepositoryError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Reviewer's display name; `None` if the account was deleted.
    pub reviewer_name: Option<String>,
}

const REVIEW_SELECT: &str = "SELECT r.id, r.product_id, r.user_id, r.rating, r.comment, r.created_at, \
     COALESCE(u.name, NULLIF(TRIM(CONCAT_WS(' ', u.first_name, u.last_name)), ''), \
              split_part(u.email, '@', 1)) AS reviewer_name \
     FROM reviews r LEFT JOIN users u ON u.id = r.user_id";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let sql = format!("{REVIEW_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC");
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?;
        Ok(reviews)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product does not exist.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let review_id: ReviewId = sqlx::query_scalar(
            "INSERT INTO reviews (product_id, user_id, rating, comment) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Product not found"))?;

        let sql = format!("{REVIEW_SELECT} WHERE r.id = $1");
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(review_id)
            .fetch_one(self.pool)
            .await?;
        Ok(review)
    }
}
