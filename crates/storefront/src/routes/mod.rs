//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /api/shop                     - Filtered, paginated listing with facets
//!
//! GET    /api/products                 - All products
//! GET    /api/products/{id}            - Product detail
//! GET    /api/products/{id}/reviews    - Reviews, newest first
//! POST   /api/products/{id}/reviews    - Post a review (user)
//!
//! GET    /api/categories               - All categories
//! GET    /api/categories/{id}          - One category
//!
//! GET    /api/cart                     - Cart lines (user)
//! POST   /api/cart                     - Add product (user)
//! PATCH  /api/cart/{id}                - Set line quantity (user)
//! DELETE /api/cart/{id}                - Remove line (user)
//!
//! POST   /api/checkout                 - Cart to order (user)
//! GET    /api/orders                   - Order history (user)
//! GET    /api/orders/{id}              - One order (user)
//!
//! POST   /api/auth/register            - Create account (rate limited)
//! POST   /api/auth/login               - Credentials login (rate limited)
//! POST   /api/auth/logout              - End session
//! GET    /api/auth/session             - Current user or null
//! GET    /api/auth/google/login        - Redirect to Google (rate limited)
//! GET    /api/auth/google/callback     - Google redirect target (rate limited)
//! ```

pub mod auth;
pub mod cart;
pub mod categories;
pub mod google_auth;
pub mod orders;
pub mod products;
pub mod shop;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Auth routes. Credential and OAuth entry points share one per-IP limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/google/login", get(google_auth::login))
        .route("/google/callback", get(google_auth::callback))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
        .merge(limited)
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{id}", get(categories::show))
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{id}", patch(cart::update).delete(cart::remove))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/shop", get(shop::index))
        .nest("/api/products", product_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(orders::checkout))
        .nest("/api/orders", order_routes())
        .nest("/api/auth", auth_routes())
}
