//! Order repository: checkout, customer order history and admin order
//! management.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::types::Json;
use thiserror::Error;

use vegi_shop_core::{
    CartId, OrderId, OrderItemId, OrderStatus, Price, ProductId, ShippingAddress, UserId,
};

use super::carts::CartRepository;
use crate::RepositoryError;

const ORDER_COLUMNS: &str =
    "o.id, o.user_id, o.status, o.total_amount, o.shipping_address, o.created_at, o.updated_at";

const ITEMS_SUBQUERY: &str = "COALESCE((\
     SELECT json_agg(json_build_object(\
         'id', oi.id, 'product_id', oi.product_id, 'product_name', p.name, \
         'quantity', oi.quantity, 'price', oi.price) ORDER BY oi.id) \
     FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id \
     WHERE oi.order_id = o.id), '[]'::json)";

/// One order line. `price` is the unit price captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    /// `None` once the product has been deleted.
    pub product_name: Option<String>,
    pub quantity: i32,
    pub price: Price,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.line_total(self.quantity)
    }
}

/// An order with its lines.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub shipping_address: Option<Json<ShippingAddress>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Json<Vec<OrderItem>>,
}

/// An order as listed in the admin API, with customer details.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminOrder {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
}

/// Admin order detail with the subtotal recomputed from the line snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrderDetail {
    #[serde(flatten)]
    pub order: AdminOrder,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

impl From<AdminOrder> for AdminOrderDetail {
    fn from(order: AdminOrder) -> Self {
        let subtotal = order.order.items.0.iter().map(OrderItem::line_total).sum();
        Self { order, subtotal }
    }
}

/// Errors specific to checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

#[derive(sqlx::FromRow)]
struct CheckoutLine {
    product_id: ProductId,
    name: String,
    price: Price,
    stock_quantity: i32,
    quantity: i32,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into a pending order.
    ///
    /// In one transaction: lock the cart, then its products, verify stock, create the
    /// order with unit price snapshots, decrement stock and empty the cart.
    /// Any failure rolls everything back.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::InsufficientStock`
    /// for business rule failures and `CheckoutError::Repository` otherwise.
    pub async fn checkout(
        &self,
        user_id: UserId,
        shipping_address: &ShippingAddress,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let cart_id: CartId = CartRepository::get_or_create_on(&mut *tx, user_id).await?;

        // Serialises checkouts of one cart; the line read below then runs on
        // a snapshot taken after any earlier checkout committed.
        sqlx::query("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        // Lock rows in product id order so concurrent checkouts cannot deadlock
        let lines = sqlx::query_as::<_, CheckoutLine>(
            r"
            SELECT p.id AS product_id, p.name, p.price, p.stock_quantity, ci.quantity
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY p.id
            FOR UPDATE OF p
            ",
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(short) = lines.iter().find(|l| l.quantity > l.stock_quantity) {
            return Err(CheckoutError::InsufficientStock(short.name.clone()));
        }

        let total: Decimal = lines.iter().map(|l| l.price.line_total(l.quantity)).sum();

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO orders (user_id, status, total_amount, shipping_address)
            VALUES ($1, 'pending', $2, $3)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(total)
        .bind(Json(shipping_address))
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity - $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        CartRepository::clear(&mut *tx, cart_id).await?;

        let sql = format!("SELECT {ORDER_COLUMNS}, {ITEMS_SUBQUERY} AS items FROM orders o WHERE o.id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            lines = lines.len(),
            total = %order.total_amount,
            "Order placed"
        );
        Ok(order)
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}, {ITEMS_SUBQUERY} AS items FROM orders o \
             WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(orders)
    }

    /// One of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}, {ITEMS_SUBQUERY} AS items FROM orders o \
             WHERE o.id = $1 AND o.user_id = $2"
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    fn admin_select() -> String {
        format!(
            "SELECT {ORDER_COLUMNS}, {ITEMS_SUBQUERY} AS items, u.email AS customer_email, \
             COALESCE(u.name, NULLIF(TRIM(CONCAT_WS(' ', u.first_name, u.last_name)), '')) AS customer_name \
             FROM orders o LEFT JOIN users u ON u.id = o.user_id"
        )
    }

    /// Every order, newest first, with customer details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<AdminOrder>, RepositoryError> {
        let sql = format!(
            "{} ORDER BY o.created_at DESC, o.id DESC",
            Self::admin_select()
        );
        let orders = sqlx::query_as::<_, AdminOrder>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(orders)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_detail(
        &self,
        order_id: OrderId,
    ) -> Result<Option<AdminOrderDetail>, RepositoryError> {
        let sql = format!("{} WHERE o.id = $1", Self::admin_select());
        let order = sqlx::query_as::<_, AdminOrder>(&sql)
            .bind(order_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order.map(AdminOrderDetail::from))
    }

    /// Set an order's status. Returns `false` if the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(order_id)
                .bind(status)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Total and pending order counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<(i64, i64), RepositoryError> {
        let counts: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'pending') FROM orders",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(counts)
    }
}
