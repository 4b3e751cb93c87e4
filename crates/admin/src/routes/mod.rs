//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! POST   /api/auth/login            - Password login (admins only)
//! POST   /api/auth/logout           - End session
//!
//! GET    /api/dashboard             - Counters and recent products
//!
//! GET    /api/categories            - All categories
//! POST   /api/categories            - Create
//! GET    /api/categories/{id}       - One category
//! PATCH  /api/categories/{id}       - Update
//! DELETE /api/categories/{id}       - Delete (refused while products reference it)
//!
//! GET    /api/products              - All products
//! POST   /api/products              - Create (multipart)
//! GET    /api/products/{id}         - One product
//! PATCH  /api/products/{id}         - Update (multipart)
//! DELETE /api/products/{id}         - Delete
//!
//! GET    /api/orders                - All orders
//! GET    /api/orders/{id}           - One order with subtotal
//! PATCH  /api/orders/{id}           - Set status
//!
//! POST   /api/generate-image        - Stable Diffusion txt2img
//! GET    /api/iconscout/search      - IconScout search
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod icons;
pub mod images;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .patch(categories::update)
                .delete(categories::delete),
        )
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::delete),
        )
        .layer(DefaultBodyLimit::max(products::MAX_FORM_BYTES))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show).patch(orders::update_status))
}

/// Create all API routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .route("/api/dashboard", get(dashboard::stats))
        .nest("/api/categories", category_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .route("/api/generate-image", post(images::generate))
        .route("/api/iconscout/search", get(icons::search))
}
