//! Typed client for the admin API.

use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use vegi_shop_core::{CategoryId, OrderId, ProductId};

use crate::{ClientError, check, session_client};

/// Text fields and image files of a product form.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub old_price: Option<String>,
    pub stock_quantity: String,
    pub category_id: String,
    pub is_new: bool,
    pub is_sale: bool,
    /// JSON object text, e.g. `{"calories":"23"}`.
    pub nutritional_info: Option<String>,
    /// `(file name, MIME type, bytes)` per image.
    pub images: Vec<(String, String, Vec<u8>)>,
}

impl ProductForm {
    fn into_multipart(self) -> Result<Form, ClientError> {
        let mut form = Form::new()
            .text("name", self.name)
            .text("price", self.price)
            .text("stock_quantity", self.stock_quantity)
            .text("category_id", self.category_id)
            .text("is_new", self.is_new.to_string())
            .text("is_sale", self.is_sale.to_string());

        for (key, value) in [
            ("description", self.description),
            ("old_price", self.old_price),
            ("nutritional_info", self.nutritional_info),
        ] {
            if let Some(value) = value {
                form = form.text(key, value);
            }
        }

        for (file_name, mime, bytes) in self.images {
            let part = Part::bytes(bytes).file_name(file_name).mime_str(&mime)?;
            form = form.part("images", part);
        }
        Ok(form)
    }
}

/// Admin API client.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base_url: String,
}

impl AdminClient {
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

    /// Client for [`admin_base_url`](crate::admin_base_url).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&crate::admin_base_url())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 401 for bad credentials or a
    /// non-admin account.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;
        Ok(body["user"].clone())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self.http.post(self.url("/api/auth/logout")).send().await?;
        check(response).await.map(|_| ())
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 401 when signed out.
    pub async fn dashboard(&self) -> Result<Value, ClientError> {
        self.get_json("/api/dashboard").await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn categories(&self) -> Result<Vec<Value>, ClientError> {
        let response = self.http.get(self.url("/api/categories")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 400 for a taken or malformed slug.
    pub async fn create_category(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(self.url("/api/categories"))
            .json(&json!({ "name": name, "slug": slug, "description": description }))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown category.
    pub async fn update_category(
        &self,
        id: CategoryId,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Value, ClientError> {
        let response = self
            .http
            .patch(self.url(&format!("/api/categories/{id}")))
            .json(&json!({ "name": name, "slug": slug, "description": description }))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 400 while products reference it.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/categories/{id}")))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 400 naming the first invalid field.
    pub async fn create_product(&self, form: ProductForm) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(self.url("/api/products"))
            .multipart(form.into_multipart()?)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown product.
    pub async fn update_product(&self, id: ProductId, form: ProductForm) -> Result<Value, ClientError> {
        let response = self
            .http
            .patch(self.url(&format!("/api/products/{id}")))
            .multipart(form.into_multipart()?)
            .send()
            .await?;
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
    /// Returns `ClientError::Status` with 404 for an unknown product.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/products/{id}")))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn orders(&self) -> Result<Vec<Value>, ClientError> {
        let response = self.http.get(self.url("/api/orders")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown order.
    pub async fn order(&self, id: OrderId) -> Result<Value, ClientError> {
        self.get_json(&format!("/api/orders/{id}")).await
    }

    /// Set an order's status. Returns the plain-text confirmation.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 400 for an unknown status.
    pub async fn update_order_status(&self, id: OrderId, status: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .patch(self.url(&format!("/api/orders/{id}")))
            .json(&json!({ "status": status }))
            .send()
            .await?;
        Ok(check(response).await?.text().await?)
    }
}
