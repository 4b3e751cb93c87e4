//! Product management.
//!
//! Create and update take a multipart form. The product row and its image
//! rows are written in one transaction. Image files are written under fresh
//! names before the commit and removed again if it fails; files of replaced
//! image rows are removed only after the commit.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use sqlx::{Postgres, Transaction};
use tracing::instrument;

use vegi_shop_core::{CategoryId, NutritionalInfo, Price, ProductId, Slug};
use vegi_shop_db::{ProductDetail, ProductInput, ProductRepository, ProductSummary, RepositoryError};

use crate::error::{AppError, Result};
use crate::extract::{ApiPath, non_blank};
use crate::middleware::RequireAdmin;
use crate::services::{ImageUpload, remove_images, store_images};
use crate::state::AppState;

/// Largest accepted product form, images included.
pub const MAX_FORM_BYTES: usize = 25 * 1024 * 1024;

/// Text fields and files of a product form, before validation.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub old_price: Option<String>,
    pub stock_quantity: Option<String>,
    pub category_id: Option<String>,
    pub is_new: Option<String>,
    pub is_sale: Option<String>,
    pub nutritional_info: Option<String>,
    pub images: Vec<ImageUpload>,
}

impl ProductForm {
    /// Drain a multipart body. Unknown fields are ignored, as are empty file
    /// parts (browsers send one when no file was picked).
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == "images" {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.images.push(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field.text().await?;
            let slot = match name.as_str() {
                "name" => &mut form.name,
                "description" => &mut form.description,
                "price" => &mut form.price,
                "old_price" => &mut form.old_price,
                "stock_quantity" => &mut form.stock_quantity,
                "category_id" => &mut form.category_id,
                "is_new" => &mut form.is_new,
                "is_sale" => &mut form.is_sale,
                "nutritional_info" => &mut form.nutritional_info,
                _ => continue,
            };
            *slot = Some(value);
        }

        Ok(form)
    }

    /// Validate the text fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` naming the first invalid field.
    pub fn validate(&self) -> Result<ProductInput> {
        let bad = |msg: &str| AppError::BadRequest(msg.to_string());

        let name = non_blank(self.name.as_deref()).ok_or_else(|| bad("Name is required"))?;
        let slug = Slug::from_name(name)
            .map_err(|_| bad("Name must contain at least one letter or digit"))?;

        let price = non_blank(self.price.as_deref())
            .and_then(|v| Price::parse(v).ok())
            .ok_or_else(|| bad("Invalid price"))?;

        let old_price = non_blank(self.old_price.as_deref())
            .map(|v| Price::parse(v).map_err(|_| bad("Invalid old_price")))
            .transpose()?;

        let stock_quantity = non_blank(self.stock_quantity.as_deref())
            .and_then(|v| v.parse::<i32>().ok())
            .filter(|q| *q >= 0)
            .ok_or_else(|| bad("Invalid stock_quantity"))?;

        let category_id = non_blank(self.category_id.as_deref())
            .and_then(|v| v.parse::<CategoryId>().ok())
            .ok_or_else(|| bad("Category not found"))?;

        let nutritional_info = non_blank(self.nutritional_info.as_deref())
            .map(|v| {
                serde_json::from_str::<NutritionalInfo>(v).map_err(|_| bad("Invalid nutritional_info"))
            })
            .transpose()?
            .filter(|info| !info.is_empty());

        Ok(ProductInput {
            name: name.to_string(),
            slug,
            description: non_blank(self.description.as_deref()).map(String::from),
            price,
            old_price,
            stock_quantity,
            category_id,
            is_new: checkbox(self.is_new.as_deref()),
            is_sale: checkbox(self.is_sale.as_deref()),
            nutritional_info,
        })
    }
}

/// HTML checkbox / JS boolean semantics.
fn checkbox(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "on" | "1")
    )
}

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// Store the form's images, point the product's image rows at them and
/// commit. With no images the existing rows are kept. Returns the URLs of
/// the replaced rows; on failure the new files are removed again.
async fn commit_with_images(
    state: &AppState,
    mut tx: Transaction<'_, Postgres>,
    id: ProductId,
    images: &[ImageUpload],
) -> Result<Vec<String>> {
    if images.is_empty() {
        tx.commit().await.map_err(RepositoryError::from)?;
        return Ok(Vec::new());
    }

    let dir = &state.config().upload_dir;
    let urls = store_images(dir, id, images).await?;
    let replaced = async {
        let replaced = ProductRepository::replace_images(&mut tx, id, &urls).await?;
        tx.commit().await.map_err(RepositoryError::from)?;
        Ok::<_, RepositoryError>(replaced)
    }
    .await;

    match replaced {
        Ok(replaced) => Ok(replaced),
        Err(err) => {
            remove_images(dir, &urls).await;
            Err(err.into())
        }
    }
}

async fn summary(state: &AppState, id: ProductId) -> Result<ProductSummary> {
    ProductRepository::new(state.pool())
        .get_summary(id)
        .await?
        .ok_or_else(not_found)
}

#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<ProductSummary>>> {
    Ok(Json(ProductRepository::new(state.pool()).list().await?))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductDetail>> {
    ProductRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductSummary>)> {
    let form = ProductForm::read(multipart).await?;
    let input = form.validate()?;

    let mut tx = state.pool().begin().await.map_err(RepositoryError::from)?;
    let product = ProductRepository::insert(&mut tx, &input).await?;
    commit_with_images(&state, tx, product.id, &form.images).await?;

    tracing::info!(product_id = %product.id, images = form.images.len(), "Product created");
    Ok((StatusCode::CREATED, Json(summary(&state, product.id).await?)))
}

#[instrument(skip(state, _admin, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    multipart: Multipart,
) -> Result<Json<ProductSummary>> {
    let form = ProductForm::read(multipart).await?;
    let input = form.validate()?;

    let mut tx = state.pool().begin().await.map_err(RepositoryError::from)?;
    ProductRepository::update(&mut tx, id, &input)
        .await?
        .ok_or_else(not_found)?;
    // Attached images replace the existing set; none keeps it
    let replaced = commit_with_images(&state, tx, id, &form.images).await?;
    remove_images(&state.config().upload_dir, &replaced).await;

    tracing::info!(product_id = %id, images = form.images.len(), "Product updated");
    Ok(Json(summary(&state, id).await?))
}

#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: Some("Baby Spinach".to_string()),
            description: Some("Tender leaves".to_string()),
            price: Some("3.49".to_string()),
            old_price: Some(String::new()),
            stock_quantity: Some("40".to_string()),
            category_id: Some("2".to_string()),
            is_new: Some("on".to_string()),
            is_sale: Some("false".to_string()),
            nutritional_info: Some(r#"{"calories":"23","protein":"2.9g"}"#.to_string()),
            images: Vec::new(),
        }
    }

    fn message(form: &ProductForm) -> String {
        match form.validate().unwrap_err() {
            AppError::BadRequest(msg) => msg,
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_form() {
        let input = form().validate().unwrap();
        assert_eq!(input.name, "Baby Spinach");
        assert_eq!(input.slug.as_str(), "baby-spinach");
        assert_eq!(input.price.amount(), Decimal::new(349, 2));
        assert!(input.old_price.is_none());
        assert_eq!(input.stock_quantity, 40);
        assert_eq!(input.category_id, CategoryId::new(2));
        assert!(input.is_new);
        assert!(!input.is_sale);
        let info = input.nutritional_info.unwrap();
        assert_eq!(info.calories.as_deref(), Some("23"));
        assert!(info.fat.is_none());
    }

    #[test]
    fn test_required_fields() {
        let mut f = form();
        f.name = Some("  ".to_string());
        assert_eq!(message(&f), "Name is required");

        let mut f = form();
        f.price = Some("-1".to_string());
        assert_eq!(message(&f), "Invalid price");

        let mut f = form();
        f.price = None;
        assert_eq!(message(&f), "Invalid price");

        let mut f = form();
        f.stock_quantity = Some("2.5".to_string());
        assert_eq!(message(&f), "Invalid stock_quantity");

        let mut f = form();
        f.stock_quantity = Some("-3".to_string());
        assert_eq!(message(&f), "Invalid stock_quantity");

        let mut f = form();
        f.category_id = Some("greens".to_string());
        assert_eq!(message(&f), "Category not found");
    }

    #[test]
    fn test_optional_fields() {
        let mut f = form();
        f.old_price = Some("4.99".to_string());
        assert_eq!(
            f.validate().unwrap().old_price.unwrap().amount(),
            Decimal::new(499, 2)
        );

        f.old_price = Some("cheap".to_string());
        assert_eq!(message(&f), "Invalid old_price");

        let mut f = form();
        f.nutritional_info = Some("{}".to_string());
        assert!(f.validate().unwrap().nutritional_info.is_none());

        f.nutritional_info = Some("[1,2]".to_string());
        assert_eq!(message(&f), "Invalid nutritional_info");
    }

    #[test]
    fn test_checkbox() {
        for yes in ["true", "on", "1", "TRUE"] {
            assert!(checkbox(Some(yes)), "{yes}");
        }
        for no in ["false", "off", "0", ""] {
            assert!(!checkbox(Some(no)), "{no}");
        }
        assert!(!checkbox(None));
    }
}
