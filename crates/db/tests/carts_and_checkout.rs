//! Database tests for cart writes and checkout.
//!
//! These tests require a running `PostgreSQL` server:
//! ```bash
//! TEST_DATABASE_URL=postgres://localhost/vegi_shop_test \
//!     cargo test -p vegi-shop-db -- --ignored
//! ```
//!
//! Migrations are applied on connect. Every test creates its own user,
//! category and product, so runs do not interfere.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::PgPool;

use vegi_shop_core::cart::MAX_LINE_QUANTITY;
use vegi_shop_core::{Email, Price, ProductId, ShippingAddress, Slug, UserId};
use vegi_shop_db::{
    CartRepository, CategoryInput, CategoryRepository, CheckoutError, NewUser, OrderRepository,
    ProductInput, ProductRepository, UserRepository,
};

async fn pool() -> PgPool {
    let url = vegi_shop_db::database_url_from_env("TEST_DATABASE_URL").unwrap();
    let pool = vegi_shop_db::create_pool(&url).await.unwrap();
    vegi_shop_db::run_migrations(&pool).await.unwrap();
    pool
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

async fn user(pool: &PgPool) -> UserId {
    let email = Email::parse(&format!("{}@example.com", unique("shopper"))).unwrap();
    UserRepository::new(pool)
        .create(&email, &NewUser::default())
        .await
        .unwrap()
        .id
}

async fn product(pool: &PgPool, stock_quantity: i32) -> ProductId {
    let category = CategoryRepository::new(pool)
        .create(&CategoryInput {
            name: unique("Greens"),
            slug: Slug::parse(&unique("greens")).unwrap(),
            description: None,
        })
        .await
        .unwrap();

    let name = unique("Kale");
    let mut conn = pool.acquire().await.unwrap();
    ProductRepository::insert(
        &mut conn,
        &ProductInput {
            slug: Slug::from_name(&name).unwrap(),
            name,
            description: None,
            price: Price::new(Decimal::new(299, 2)).unwrap(),
            old_price: None,
            stock_quantity,
            category_id: category.id,
            is_new: false,
            is_sale: false,
            nutritional_info: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn address() -> ShippingAddress {
    ShippingAddress {
        street: "1 Market Street".to_owned(),
        city: "Springfield".to_owned(),
        state: "OR".to_owned(),
        zip: "97477".to_owned(),
        country: "US".to_owned(),
    }
}

async fn stock(pool: &PgPool, id: ProductId) -> i32 {
    sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_concurrent_checkouts_place_one_order() {
    let pool = pool().await;
    let user_id = user(&pool).await;
    let product_id = product(&pool, 10).await;
    CartRepository::new(&pool)
        .add_item(user_id, product_id, 1)
        .await
        .unwrap();

    // Hold the product row so both checkouts are in flight at once
    let mut blocker = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
        .bind(product_id)
        .execute(&mut *blocker)
        .await
        .unwrap();

    let checkouts: Vec<_> = (0..2)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                OrderRepository::new(&pool)
                    .checkout(user_id, &address())
                    .await
                    .map(|order| order.id)
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(300)).await;
    blocker.commit().await.unwrap();

    let mut placed = 0;
    let mut empty = 0;
    for handle in checkouts {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(CheckoutError::EmptyCart) => empty += 1,
            Err(other) => panic!("unexpected checkout error: {other}"),
        }
    }
    assert_eq!((placed, empty), (1, 1));

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 1);
    assert_eq!(stock(&pool, product_id).await, 9);
    assert!(CartRepository::new(&pool).lines(user_id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_checkout_with_short_stock_writes_nothing() {
    let pool = pool().await;
    let user_id = user(&pool).await;
    let product_id = product(&pool, 2).await;
    CartRepository::new(&pool)
        .add_item(user_id, product_id, 3)
        .await
        .unwrap();

    let err = OrderRepository::new(&pool)
        .checkout(user_id, &address())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InsufficientStock(_)));
    assert_eq!(stock(&pool, product_id).await, 2);
    assert_eq!(CartRepository::new(&pool).lines(user_id).await.unwrap().len(), 1);
}

// =============================================================================
// Cart lines
// =============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_repeated_adds_cap_line_quantity() {
    let pool = pool().await;
    let user_id = user(&pool).await;
    let product_id = product(&pool, 5).await;
    let carts = CartRepository::new(&pool);

    let first = carts
        .add_item(user_id, product_id, MAX_LINE_QUANTITY)
        .await
        .unwrap();
    let second = carts
        .add_item(user_id, product_id, MAX_LINE_QUANTITY)
        .await
        .unwrap();

    assert_eq!(first, second);
    let lines = carts.lines(user_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, MAX_LINE_QUANTITY);
}
