//! Product image generation.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, non_blank};
use crate::middleware::RequireAdmin;
use crate::services::GeneratedImage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateImageResponse {
    pub images: Vec<GeneratedImage>,
}

#[instrument(skip_all)]
pub async fn generate(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(body): ApiJson<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>> {
    let prompt = non_blank(body.prompt.as_deref())
        .ok_or_else(|| AppError::BadRequest("Prompt is required".to_string()))?;

    let images = state.stable_diffusion().txt2img(prompt).await?;
    Ok(Json(GenerateImageResponse { images }))
}
