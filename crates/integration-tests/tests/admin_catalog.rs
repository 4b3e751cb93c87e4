//! Admin catalog and order management against a running admin server.
//!
//! These tests require:
//! - A migrated database with an admin account
//!   (`vegi-cli admin create -e $TEST_ADMIN_EMAIL -p $TEST_ADMIN_PASSWORD`)
//! - The admin server running (cargo run -p vegi-shop-admin)
//! - The storefront server running for the order test
//!
//! Run with: cargo test -p vegi-shop-integration-tests -- --ignored

#![allow(clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;
use vegi_shop_core::{CategoryId, OrderId, ProductId, ProductImage, ShippingAddress};
use vegi_shop_integration_tests::{AdminClient, ProductForm, StorefrontClient};

/// Admin client with a live session.
async fn admin() -> AdminClient {
    let email = std::env::var("TEST_ADMIN_EMAIL").expect("TEST_ADMIN_EMAIL not set");
    let password = std::env::var("TEST_ADMIN_PASSWORD").expect("TEST_ADMIN_PASSWORD not set");
    let client = AdminClient::from_env().expect("Failed to create HTTP client");
    client
        .login(&email, &password)
        .await
        .expect("Failed to log in as admin");
    client
}

fn unique_slug(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn id_of(value: &Value) -> i32 {
    i32::try_from(value["id"].as_i64().expect("numeric id")).expect("id fits")
}

fn product_form(category_id: CategoryId) -> ProductForm {
    ProductForm {
        name: format!("Test Radish {}", Uuid::new_v4().simple()),
        description: Some("Peppery and crisp".to_owned()),
        price: "1.25".to_owned(),
        stock_quantity: "12".to_owned(),
        category_id: category_id.to_string(),
        is_new: true,
        nutritional_info: Some(r#"{"calories":"16"}"#.to_owned()),
        images: vec![(
            "radish.png".to_owned(),
            "image/png".to_owned(),
            b"\x89PNG\r\n\x1a\nnot-really-a-png".to_vec(),
        )],
        ..ProductForm::default()
    }
}

// ============================================================================
// Auth Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_requires_admin_session() {
    let client = AdminClient::from_env().expect("Failed to create HTTP client");

    let err = client.dashboard().await.expect_err("anonymous dashboard");
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    let err = client
        .login("nobody@example.com", "wrong-password")
        .await
        .expect_err("bad credentials");
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.message(), Some("Invalid email or password"));
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_customer_account_cannot_log_in() {
    let email = format!("customer-{}@example.com", Uuid::new_v4());
    let shopper = StorefrontClient::from_env().expect("Failed to create HTTP client");
    shopper
        .register(&email, "kohlrabi-rules", None, None)
        .await
        .expect("register");

    let client = AdminClient::from_env().expect("Failed to create HTTP client");
    let err = client
        .login(&email, "kohlrabi-rules")
        .await
        .expect_err("customers are not admins");
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.message(), Some("Invalid email or password"));
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_logout_ends_session() {
    let client = admin().await;
    client.dashboard().await.expect("dashboard while signed in");

    client.logout().await.expect("logout");
    let err = client.dashboard().await.expect_err("dashboard after logout");
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}

// ============================================================================
// Category Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_category_crud() {
    let client = admin().await;
    let slug = unique_slug("brassicas");

    let created = client
        .create_category("Brassicas", &slug, Some("Cabbage family"))
        .await
        .expect("create");
    assert_eq!(created["slug"], slug.as_str());
    let id = CategoryId::new(id_of(&created));

    let err = client
        .create_category("Brassicas again", &slug, None)
        .await
        .expect_err("duplicate slug");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.message(), Some("Slug must be unique"));

    let updated = client
        .update_category(id, "Cabbages", &slug, None)
        .await
        .expect("update keeping own slug");
    assert_eq!(updated["name"], "Cabbages");
    assert!(updated["description"].is_null());

    client.delete_category(id).await.expect("delete");
    let err = client.delete_category(id).await.expect_err("already deleted");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_category_validation() {
    let client = admin().await;

    let err = client
        .create_category("", "", None)
        .await
        .expect_err("blank fields");
    assert_eq!(err.message(), Some("Name and slug are required"));

    let err = client
        .create_category("Herbs", "Fresh Herbs", None)
        .await
        .expect_err("malformed slug");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

// ============================================================================
// Product Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_product_lifecycle_with_upload() {
    let client = admin().await;
    let category = client
        .create_category("Radishes", &unique_slug("radishes"), None)
        .await
        .expect("create category");
    let category_id = CategoryId::new(id_of(&category));

    let created = client
        .create_product(product_form(category_id))
        .await
        .expect("create product");
    let product_id = ProductId::new(id_of(&created));
    assert_eq!(created["category_name"], "Radishes");
    assert_eq!(created["nutritional_info"]["calories"], "16");
    let images: Vec<ProductImage> =
        serde_json::from_value(created["images"].clone()).expect("images");
    assert_eq!(images.len(), 1);
    let primary = ProductImage::primary(&images).expect("primary image");
    assert!(primary.is_primary);
    assert!(primary.image_url.starts_with("/uploads/") && primary.image_url.ends_with(".png"));

    // The category is now in use
    let err = client
        .delete_category(category_id)
        .await
        .expect_err("category with products");
    assert_eq!(
        err.message(),
        Some("Cannot delete category with associated products")
    );

    // An update without files keeps the images
    let mut form = product_form(category_id);
    form.price = "1.50".to_owned();
    form.images.clear();
    let updated = client.update_product(product_id, form).await.expect("update");
    assert_eq!(updated["price"], 1.5);
    assert_eq!(updated["images"].as_array().expect("images").len(), 1);

    client.delete_product(product_id).await.expect("delete product");
    let err = client.product(product_id).await.expect_err("deleted product");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    client.delete_category(category_id).await.expect("delete category");
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_product_validation() {
    let client = admin().await;

    let mut form = product_form(CategoryId::new(i32::MAX));
    form.images.clear();
    let err = client
        .create_product(form.clone())
        .await
        .expect_err("unknown category");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.message(), Some("Category not found"));

    form.price = "free".to_owned();
    let err = client.create_product(form).await.expect_err("bad price");
    assert_eq!(err.message(), Some("Invalid price"));
}

// ============================================================================
// Order Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin and storefront servers, seeded catalog"]
async fn test_order_status_update() {
    // Place an order as a shopper
    let shopper = StorefrontClient::from_env().expect("Failed to create HTTP client");
    shopper
        .register(&format!("orders-{}@example.com", Uuid::new_v4()), "parsnip-soup", None, None)
        .await
        .expect("register");
    let products = shopper.products().await.expect("products");
    let product = products
        .iter()
        .find(|p| p["stock_quantity"].as_i64().unwrap_or(0) >= 1)
        .expect("No stocked product; seed the catalog first");
    shopper
        .add_to_cart(ProductId::new(id_of(product)), 1)
        .await
        .expect("add");
    let order = shopper
        .checkout(&ShippingAddress {
            street: "1 Market St".to_owned(),
            city: "Oakland".to_owned(),
            state: "CA".to_owned(),
            zip: "94607".to_owned(),
            country: "US".to_owned(),
        })
        .await
        .expect("checkout");
    let order_id = OrderId::new(id_of(&order));

    let client = admin().await;
    let detail = client.order(order_id).await.expect("order detail");
    assert_eq!(detail["status"], "pending");
    assert!(detail["subtotal"].is_number());

    let message = client
        .update_order_status(order_id, "shipped")
        .await
        .expect("status update");
    assert_eq!(message, "Order updated successfully");
    assert_eq!(
        client.order(order_id).await.expect("order")["status"],
        "shipped"
    );

    let err = client
        .update_order_status(order_id, "teleported")
        .await
        .expect_err("unknown status");
    assert_eq!(err.message(), Some("Invalid status"));
}
