//! Cart flow against a running storefront.
//!
//! These tests require:
//! - A migrated and seeded database (`vegi-cli migrate`, `vegi-cli seed data/seed.yaml`)
//! - The storefront server running (cargo run -p vegi-shop-storefront)
//!
//! Run with: cargo test -p vegi-shop-integration-tests -- --ignored

#![allow(clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;
use vegi_shop_core::cart::CartError;
use vegi_shop_core::{CartItemId, ProductId};
use vegi_shop_integration_tests::{CartContext, StorefrontClient};

const PASSWORD: &str = "carrots-and-peas";

/// A fresh, signed-in shopper.
async fn shopper() -> StorefrontClient {
    let client = StorefrontClient::from_env().expect("Failed to create HTTP client");
    let email = format!("shopper-{}@example.com", Uuid::new_v4());
    client
        .register(&email, PASSWORD, Some("Test"), Some("Shopper"))
        .await
        .expect("Failed to register shopper");
    client
}

/// Some product with at least `min_stock` units.
async fn stocked_product(client: &StorefrontClient, min_stock: i64) -> ProductId {
    let products = client.products().await.expect("Failed to list products");
    let product: &Value = products
        .iter()
        .find(|p| p["stock_quantity"].as_i64().unwrap_or(0) >= min_stock)
        .expect("No stocked product; seed the catalog first");
    ProductId::new(i32::try_from(product["id"].as_i64().expect("product id")).expect("id fits"))
}

// ============================================================================
// Access Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_cart_requires_login() {
    let client = StorefrontClient::from_env().expect("Failed to create HTTP client");

    let err = client.cart().await.expect_err("anonymous cart should fail");
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.message(), Some("Unauthorized"));

    // The context treats a signed-out shopper as an empty cart
    let mut ctx = CartContext::new(&client);
    ctx.refresh().await.expect("refresh should succeed when signed out");
    assert!(ctx.cart().is_empty());
}

// ============================================================================
// Mutation Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_add_twice_increments_one_line() {
    let client = shopper().await;
    let product_id = stocked_product(&client, 2).await;
    let mut ctx = CartContext::new(&client);

    ctx.add_to_cart(product_id).await.expect("first add");
    ctx.add_to_cart(product_id).await.expect("second add");

    // Add refetches, so the server-assigned line is visible locally
    assert_eq!(ctx.items().len(), 1);
    assert_eq!(ctx.items()[0].product_id, product_id);
    assert_eq!(ctx.items()[0].quantity, 2);
    assert_eq!(ctx.cart().item_count(), 2);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_update_and_remove() {
    let client = shopper().await;
    let product_id = stocked_product(&client, 3).await;
    let mut ctx = CartContext::new(&client);

    ctx.add_to_cart(product_id).await.expect("add");
    let item_id = ctx.items()[0].id;

    ctx.update_quantity(item_id, 3).await.expect("update");
    assert_eq!(ctx.cart().item_count(), 3);
    let expected = ctx.items()[0].price.line_total(3);
    assert_eq!(ctx.cart().subtotal(), expected);

    ctx.remove_item(item_id).await.expect("remove");
    assert!(ctx.cart().is_empty());

    // The server agrees with the local removal
    assert!(client.cart().await.expect("cart").is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_quantity_zero_removes_line() {
    let client = shopper().await;
    let product_id = stocked_product(&client, 1).await;
    let mut ctx = CartContext::new(&client);

    ctx.add_to_cart(product_id).await.expect("add");
    let item_id = ctx.items()[0].id;

    ctx.update_quantity(item_id, 0).await.expect("update to zero");
    assert!(ctx.cart().is_empty());
}

// ============================================================================
// Rollback Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_rejected_update_rolls_back() {
    let client = shopper().await;
    let product_id = stocked_product(&client, 1).await;
    let mut ctx = CartContext::new(&client);

    ctx.add_to_cart(product_id).await.expect("add");
    let before = ctx.cart().clone();

    let err = ctx
        .update_quantity(CartItemId::new(i32::MAX), 4)
        .await
        .expect_err("unknown line should be rejected");
    assert!(matches!(
        err,
        CartError::Rejected { status: 404, ref message } if message == "Cart item not found"
    ));
    assert_eq!(ctx.cart(), &before);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_add_unknown_product_rolls_back() {
    let client = shopper().await;
    let mut ctx = CartContext::new(&client);

    let err = ctx
        .add_to_cart(ProductId::new(i32::MAX))
        .await
        .expect_err("unknown product should be rejected");
    assert!(matches!(
        err,
        CartError::Rejected { status: 404, ref message } if message == "Product not found"
    ));
    assert!(ctx.cart().is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_other_users_line_is_not_found() {
    let owner = shopper().await;
    let product_id = stocked_product(&owner, 1).await;
    owner.add_to_cart(product_id, 1).await.expect("add");
    let item_id = owner.cart().await.expect("cart")[0].id;

    let intruder = shopper().await;
    let err = intruder
        .remove_cart_item(item_id)
        .await
        .expect_err("foreign line should be hidden");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    assert_eq!(owner.cart().await.expect("cart").len(), 1);
}
