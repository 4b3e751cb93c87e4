//! Product repository.
//!
//! Reads go through the pool. Writes take a `&mut PgConnection` so the admin
//! API can insert the product, store uploaded files and replace image rows
//! inside one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use vegi_shop_core::{CategoryId, NutritionalInfo, Price, ProductId, ProductImage, Slug};

use crate::RepositoryError;

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.slug, p.description, p.price, p.old_price, \
     p.stock_quantity, p.category_id, p.is_new, p.is_sale, p.nutritional_info, \
     p.created_at, p.updated_at";

/// Correlated subquery aggregating a product's images as a JSON array.
pub(crate) const IMAGES_SUBQUERY: &str = "COALESCE((\
     SELECT json_agg(json_build_object('id', pi.id, 'image_url', pi.image_url, 'is_primary', pi.is_primary) \
     ORDER BY pi.is_primary DESC, pi.id) \
     FROM product_images pi WHERE pi.product_id = p.id), '[]'::json)";

/// Average review rating with one decimal, 0 when unrated.
pub(crate) const RATING_SUBQUERY: &str =
    "COALESCE((SELECT AVG(r.rating)::numeric(2,1) FROM reviews r WHERE r.product_id = p.id), 0)";

pub(crate) const REVIEWS_COUNT_SUBQUERY: &str =
    "(SELECT COUNT(*) FROM reviews r WHERE r.product_id = p.id)";

/// A product row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Price,
    pub old_price: Option<Price>,
    pub stock_quantity: i32,
    pub category_id: CategoryId,
    pub is_new: bool,
    pub is_sale: bool,
    pub nutritional_info: Option<Json<NutritionalInfo>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product with its category name and images, as listed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
    pub images: Json<Vec<ProductImage>>,
}

/// A single product page: summary plus review aggregates.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub summary: ProductSummary,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    pub reviews_count: i64,
}

/// Validated create/update payload.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub price: Price,
    pub old_price: Option<Price>,
    pub stock_quantity: i32,
    pub category_id: CategoryId,
    pub is_new: bool,
    pub is_sale: bool,
    pub nutritional_info: Option<NutritionalInfo>,
}

fn summary_select() -> String {
    format!(
        "SELECT {PRODUCT_COLUMNS}, c.name AS category_name, {IMAGES_SUBQUERY} AS images \
         FROM products p LEFT JOIN categories c ON c.id = p.category_id"
    )
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products with category name and images, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ProductSummary>, RepositoryError> {
        self.recent(None).await
    }

    /// Newest products, optionally capped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: Option<i64>) -> Result<Vec<ProductSummary>, RepositoryError> {
        let sql = format!(
            "{} ORDER BY p.created_at DESC, p.id DESC LIMIT $1",
            summary_select()
        );
        let products = sqlx::query_as::<_, ProductSummary>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// One product with images and review aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_detail(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}, c.name AS category_name, {IMAGES_SUBQUERY} AS images, \
             {RATING_SUBQUERY} AS rating, {REVIEWS_COUNT_SUBQUERY} AS reviews_count \
             FROM products p LEFT JOIN categories c ON c.id = p.category_id \
             WHERE p.id = $1"
        );
        let product = sqlx::query_as::<_, ProductDetail>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// One product with category name and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_summary(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductSummary>, RepositoryError> {
        let sql = format!("{} WHERE p.id = $1", summary_select());
        let product = sqlx::query_as::<_, ProductSummary>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Whether any product uses `slug`. Product slugs are not unique, so
    /// this is only used to keep catalog seeding idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_exists(&self, slug: &Slug) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1)")
                .bind(slug)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Delete a product (images, cart lines and reviews cascade). Returns
    /// `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO products AS p (name, slug, description, price, old_price, stock_quantity,
                                  category_id, is_new, is_sale, nutritional_info)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(input.description.as_deref())
            .bind(input.price)
            .bind(input.old_price)
            .bind(input.stock_quantity)
            .bind(input.category_id)
            .bind(input.is_new)
            .bind(input.is_sale)
            .bind(input.nutritional_info.clone().map(Json))
            .fetch_one(conn)
            .await
            .map_err(|e| RepositoryError::from_write(e, "Category not found"))
    }

    /// Update a product. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn update(
        conn: &mut PgConnection,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE products AS p
            SET name = $2, slug = $3, description = $4, price = $5, old_price = $6,
                stock_quantity = $7, category_id = $8, is_new = $9, is_sale = $10,
                nutritional_info = $11, updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(input.description.as_deref())
            .bind(input.price)
            .bind(input.old_price)
            .bind(input.stock_quantity)
            .bind(input.category_id)
            .bind(input.is_new)
            .bind(input.is_sale)
            .bind(input.nutritional_info.clone().map(Json))
            .fetch_optional(conn)
            .await
            .map_err(|e| RepositoryError::from_write(e, "Category not found"))
    }

    /// Replace all image rows of a product. The first URL becomes primary.
    /// Returns the URLs of the rows that were replaced.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn replace_images(
        conn: &mut PgConnection,
        id: ProductId,
        image_urls: &[String],
    ) -> Result<Vec<String>, RepositoryError> {
        let replaced: Vec<String> =
            sqlx::query_scalar("DELETE FROM product_images WHERE product_id = $1 RETURNING image_url")
                .bind(id)
                .fetch_all(&mut *conn)
                .await?;

        for (index, url) in image_urls.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_images (product_id, image_url, is_primary) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(url)
            .bind(index == 0)
            .execute(&mut *conn)
            .await?;
        }
        Ok(replaced)
    }
}
