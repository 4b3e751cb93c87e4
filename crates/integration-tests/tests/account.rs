//! Accounts, sessions and reviews against a running storefront.
//!
//! These tests require:
//! - A migrated and seeded database
//! - The storefront server running (cargo run -p vegi-shop-storefront)
//!
//! Run with: cargo test -p vegi-shop-integration-tests -- --ignored

#![allow(clippy::indexing_slicing)]

use reqwest::StatusCode;
use uuid::Uuid;
use vegi_shop_core::ProductId;
use vegi_shop_integration_tests::StorefrontClient;

fn client() -> StorefrontClient {
    StorefrontClient::from_env().expect("Failed to create HTTP client")
}

fn unique_email() -> String {
    format!("Account-{}@Example.com", Uuid::new_v4())
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_login_logout() {
    let email = unique_email();
    let client = client();
    assert!(client.session_user().await.expect("session").is_null());

    let user = client
        .register(&email, "celery-sticks", Some("Ada"), Some("Lovelace"))
        .await
        .expect("register");
    assert_eq!(user["email"], email.to_lowercase());
    assert_eq!(user["name"], "Ada Lovelace");
    assert_eq!(user["role"], "user");
    assert_eq!(client.session_user().await.expect("session")["email"], user["email"]);

    client.logout().await.expect("logout");
    assert!(client.session_user().await.expect("session").is_null());

    // Login is case-insensitive on the email
    let again = client
        .login(&email.to_uppercase(), "celery-sticks")
        .await
        .expect("login");
    assert_eq!(again["id"], user["id"]);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_registration_conflicts() {
    let email = unique_email();
    client()
        .register(&email, "celery-sticks", None, None)
        .await
        .expect("first registration");

    let err = client()
        .register(&email, "another-password", None, None)
        .await
        .expect_err("duplicate email");
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_login_does_not_reveal_unknown_email() {
    let email = unique_email();
    let client = client();
    client
        .register(&email, "celery-sticks", None, None)
        .await
        .expect("register");

    let wrong_password = client
        .login(&email, "not-the-password")
        .await
        .expect_err("wrong password");
    let unknown = client
        .login(&unique_email(), "celery-sticks")
        .await
        .expect_err("unknown email");

    assert_eq!(wrong_password.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(unknown.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(wrong_password.message(), unknown.message());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_short_password_is_rejected() {
    let err = client()
        .register(&unique_email(), "short", None, None)
        .await
        .expect_err("weak password");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.message(), Some("Password must be at least 8 characters"));
}

// ============================================================================
// Review Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_post_review_updates_rating() {
    let client = client();
    client
        .register(&unique_email(), "celery-sticks", Some("Review"), Some("Writer"))
        .await
        .expect("register");

    let products = client.products().await.expect("products");
    let id = i32::try_from(products[0]["id"].as_i64().expect("id")).expect("id fits");
    let product_id = ProductId::new(id);

    let review = client
        .post_review(product_id, 4, Some("  Crunchy and fresh  "))
        .await
        .expect("post review");
    assert_eq!(review["rating"], 4);
    assert_eq!(review["comment"], "Crunchy and fresh");
    assert_eq!(review["reviewer_name"], "Review Writer");

    let reviews = client.reviews(product_id).await.expect("reviews");
    assert_eq!(reviews[0]["id"], review["id"]);

    let detail = client.product(product_id).await.expect("product");
    assert!(detail["reviews_count"].as_i64().expect("count") >= 1);
    let rating = detail["rating"].as_f64().expect("rating");
    assert!((1.0..=5.0).contains(&rating));

    let err = client
        .post_review(product_id, 6, None)
        .await
        .expect_err("rating out of range");
    assert_eq!(err.message(), Some("Rating must be between 1 and 5"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_review_requires_login() {
    let err = client()
        .post_review(ProductId::new(1), 5, None)
        .await
        .expect_err("anonymous review");
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}
