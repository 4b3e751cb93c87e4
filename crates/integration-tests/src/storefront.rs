//! Typed client for the storefront API.
//!
//! One client is one browser: the session cookie set by register/login is
//! sent on every later request.

use serde::Serialize;
use serde_json::{Value, json};
use url::Url;

use vegi_shop_core::cart::CartLine;
use vegi_shop_core::{CartItemId, ProductId, ShippingAddress};

use crate::{ClientError, check, session_client};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    email: &'a str,
    password: &'a str,
    first_name: Option<&'a str>,
    last_name: Option<&'a str>,
}

/// Storefront API client.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    http: reqwest::Client,
    base_url: String,
}

impl StorefrontClient {
    /// Client for the server at `base_url`, with an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: session_client()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Client for [`storefront_base_url`](crate::storefront_base_url).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&crate::storefront_base_url())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// `GET /health/ready`.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server and its database are up.
    pub async fn ready(&self) -> Result<(), ClientError> {
        let response = self.http.get(self.url("/health/ready")).send().await?;
        check(response).await.map(|_| ())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Register and sign in. Returns the session user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 409 if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<Value, ClientError> {
        let body = RegisterBody {
            email,
            password,
            first_name,
            last_name,
        };
        let response = self
            .http
            .post(self.url("/api/auth/register"))
            .json(&body)
            .send()
            .await?;
        let session: Value = check(response).await?.json().await?;
        Ok(session["user"].clone())
    }

    /// Sign in with email and password. Returns the session user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 401 for bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let session: Value = check(response).await?.json().await?;
        Ok(session["user"].clone())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self.http.post(self.url("/api/auth/logout")).send().await?;
        check(response).await.map(|_| ())
    }

    /// The signed-in user, `Value::Null` when anonymous.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn session_user(&self) -> Result<Value, ClientError> {
        Ok(self.get_json("/api/auth/session").await?["user"].clone())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// `GET /api/shop` with the given query parameters (camelCase names).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 400 for invalid parameters.
    pub async fn shop(&self, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        let url = Url::parse_with_params(&self.url("/api/shop"), params)?;
        let response = self.http.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn products(&self) -> Result<Vec<Value>, ClientError> {
        let response = self.http.get(self.url("/api/products")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown product.
    pub async fn product(&self, id: ProductId) -> Result<Value, ClientError> {
        self.get_json(&format!("/api/products/{id}")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn categories(&self) -> Result<Vec<Value>, ClientError> {
        let response = self.http.get(self.url("/api/categories")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn reviews(&self, product_id: ProductId) -> Result<Vec<Value>, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/products/{product_id}/reviews")))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Post a review as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 400 for an out-of-range rating.
    pub async fn post_review(
        &self,
        product_id: ProductId,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/api/products/{product_id}/reviews")))
            .json(&json!({ "rating": rating, "comment": comment }))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The server cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 401 when signed out.
    pub async fn cart(&self) -> Result<Vec<CartLine>, ClientError> {
        let response = self.http.get(self.url("/api/cart")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown product.
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: i32) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/api/cart"))
            .json(&json!({ "productId": product_id, "quantity": quantity }))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for a line the user does not own.
    pub async fn update_cart_item(&self, item_id: CartItemId, quantity: i32) -> Result<(), ClientError> {
        let response = self
            .http
            .patch(self.url(&format!("/api/cart/{item_id}")))
            .json(&json!({ "quantity": quantity }))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for a line the user does not own.
    pub async fn remove_cart_item(&self, item_id: CartItemId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/cart/{item_id}")))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Turn the cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 400 for an empty cart or an
    /// incomplete address.
    pub async fn checkout(&self, address: &ShippingAddress) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(self.url("/api/checkout"))
            .json(&json!({ "shippingAddress": address }))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn orders(&self) -> Result<Vec<Value>, ClientError> {
        let response = self.http.get(self.url("/api/orders")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for another user's order.
    pub async fn order(&self, id: i64) -> Result<Value, ClientError> {
        self.get_json(&format!("/api/orders/{id}")).await
    }
}
