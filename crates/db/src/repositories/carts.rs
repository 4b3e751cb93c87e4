//! Cart repository.
//!
//! Every statement that touches a line joins through `carts.user_id`, so a
//! user can never read or change another user's cart lines.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use vegi_shop_core::cart::{CartLine, MAX_LINE_QUANTITY};
use vegi_shop_core::{CartId, CartItemId, Price, ProductId, ProductImage, UserId};

use super::products::IMAGES_SUBQUERY;
use crate::RepositoryError;

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    product_id: ProductId,
    name: String,
    price: Price,
    old_price: Option<Price>,
    quantity: i32,
    category_name: Option<String>,
    images: Json<Vec<ProductImage>>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            price: row.price,
            old_price: row.old_price,
            quantity: row.quantity,
            category_name: row.category_name,
            images: row.images.0,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::get_or_create_on(&mut conn, user_id).await
    }

    pub(crate) async fn get_or_create_on(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<CartId, RepositoryError> {
        sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        let cart_id: CartId = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(cart_id)
    }

    /// Lines of the user's cart, creating the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let cart_id = self.get_or_create(user_id).await?;
        let sql = format!(
            r"
            SELECT ci.id, ci.quantity, p.id AS product_id, p.name, p.price, p.old_price,
                   c.name AS category_name, {IMAGES_SUBQUERY} AS images
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id
            "
        );
        let rows = sqlx::query_as::<_, CartLineRow>(&sql)
            .bind(cart_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// Add `quantity` units of a product. An existing line for the product is
    /// incremented in the same statement, capped at `MAX_LINE_QUANTITY`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product does not exist.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItemId, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let cart_id = Self::get_or_create_on(&mut conn, user_id).await?;
        let item_id: CartItemId = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE
                SET quantity = LEAST(cart_items.quantity + EXCLUDED.quantity, $4),
                    updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(MAX_LINE_QUANTITY)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Product not found"))?;
        Ok(item_id)
    }

    /// Set a line's quantity; zero deletes the line. Returns `false` if the
    /// line does not belong to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        if quantity == 0 {
            return self.remove_item(user_id, item_id).await;
        }
        let result = sqlx::query(
            r"
            UPDATE cart_items ci
            SET quantity = $3, updated_at = NOW()
            FROM carts c
            WHERE ci.cart_id = c.id AND ci.id = $1 AND c.user_id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a line. Returns `false` if it does not belong to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.id AND ci.id = $1 AND c.user_id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every line of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn clear(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
