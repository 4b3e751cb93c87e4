//! Category management.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use vegi_shop_core::{CategoryId, Slug};
use vegi_shop_db::{Category, CategoryInput, CategoryRepository};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, non_blank};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Create/update body. Fields are optional so a missing one produces the
/// same message as an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

impl TryFrom<CategoryRequest> for CategoryInput {
    type Error = AppError;

    fn try_from(body: CategoryRequest) -> Result<Self> {
        let (Some(name), Some(slug)) = (
            non_blank(body.name.as_deref()),
            non_blank(body.slug.as_deref()),
        ) else {
            return Err(AppError::BadRequest("Name and slug are required".to_string()));
        };
        let slug = Slug::parse(slug).map_err(|e| AppError::BadRequest(capitalize(&e.to_string())))?;

        Ok(Self {
            name: name.to_string(),
            slug,
            description: non_blank(body.description.as_deref()).map(String::from),
        })
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> Result<Json<Category>> {
    let input = CategoryInput::try_from(body)?;
    let categories = CategoryRepository::new(state.pool());

    if categories.slug_taken(&input.slug, None).await? {
        return Err(AppError::BadRequest("Slug must be unique".to_string()));
    }

    let category = categories.create(&input).await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
    Ok(Json(category))
}

#[instrument(skip(state, _admin, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> Result<Json<Category>> {
    let input = CategoryInput::try_from(body)?;
    let categories = CategoryRepository::new(state.pool());

    if categories.slug_taken(&input.slug, Some(id)).await? {
        return Err(AppError::BadRequest("Slug must be unique".to_string()));
    }

    categories
        .update(id, &input)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    let categories = CategoryRepository::new(state.pool());

    if categories.product_count(id).await? > 0 {
        return Err(AppError::BadRequest(
            "Cannot delete category with associated products".to_string(),
        ));
    }
    if !categories.delete(id).await? {
        return Err(not_found());
    }

    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(name: Option<&str>, slug: Option<&str>) -> CategoryRequest {
        CategoryRequest {
            name: name.map(String::from),
            slug: slug.map(String::from),
            description: Some("  ".to_string()),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) => msg,
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request() {
        let input = CategoryInput::try_from(request(Some(" Leafy Greens "), Some("leafy-greens"))).unwrap();
        assert_eq!(input.name, "Leafy Greens");
        assert_eq!(input.slug.as_str(), "leafy-greens");
        assert!(input.description.is_none());
    }

    #[test]
    fn test_name_and_slug_required() {
        for (name, slug) in [(None, Some("x")), (Some("X"), None), (Some(" "), Some("x")), (None, None)] {
            let err = CategoryInput::try_from(request(name, slug)).unwrap_err();
            assert_eq!(message(err), "Name and slug are required");
        }
    }

    #[test]
    fn test_malformed_slug() {
        let err = CategoryInput::try_from(request(Some("Greens"), Some("Leafy Greens"))).unwrap_err();
        assert!(message(err).starts_with("Slug may only contain"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("slug cannot be empty"), "Slug cannot be empty");
        assert_eq!(capitalize(""), "");
    }
}
