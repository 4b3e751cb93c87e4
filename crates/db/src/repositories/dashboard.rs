//! Admin dashboard aggregates.

use serde::Serialize;
use sqlx::PgPool;

use super::{CategoryRepository, OrderRepository, ProductRepository, ProductSummary};
use crate::RepositoryError;

/// Number of products shown under "recent products".
pub const RECENT_PRODUCTS: i64 = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_categories: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub recent_products: Vec<ProductSummary>,
}

pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn stats(&self) -> Result<DashboardStats, RepositoryError> {
        let products = ProductRepository::new(self.pool);
        let (total_orders, pending_orders) = OrderRepository::new(self.pool).counts().await?;

        Ok(DashboardStats {
            total_products: products.count().await?,
            total_categories: CategoryRepository::new(self.pool).count().await?,
            total_orders,
            pending_orders,
            recent_products: products.recent(Some(RECENT_PRODUCTS)).await?,
        })
    }
}
