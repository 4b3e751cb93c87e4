//! Stable Diffusion web UI client (`/sdapi/v1/txt2img`).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

const NEGATIVE_PROMPT: &str = "blurry, bad quality, distorted, deformed";

#[derive(Debug, Error)]
pub enum StableDiffusionError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("txt2img returned {0}")]
    Status(reqwest::StatusCode),
}

/// Fixed generation settings; only the prompt varies.
#[derive(Debug, Serialize)]
struct Txt2ImgRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'static str,
    steps: u32,
    width: u32,
    height: u32,
    cfg_scale: f32,
    batch_size: u32,
    batch_count: u32,
    sampler_name: &'static str,
    enable_hr: bool,
    denoising_strength: f32,
    seed: i64,
}

impl<'a> Txt2ImgRequest<'a> {
    const fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            negative_prompt: NEGATIVE_PROMPT,
            steps: 20,
            width: 512,
            height: 512,
            cfg_scale: 7.0,
            batch_size: 4,
            batch_count: 2,
            sampler_name: "DPM++ 3M SDE",
            enable_hr: false,
            denoising_strength: 0.7,
            seed: -1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

/// A generated image, inlined as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    pub url: String,
}

impl GeneratedImage {
    fn from_base64_png(data: &str) -> Self {
        Self {
            url: format!("data:image/png;base64,{data}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StableDiffusionClient {
    client: Client,
    base_url: String,
}

impl StableDiffusionClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Generate images for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or answers non-2xx.
    #[instrument(skip(self))]
    pub async fn txt2img(&self, prompt: &str) -> Result<Vec<GeneratedImage>, StableDiffusionError> {
        let response = self
            .client
            .post(format!("{}/sdapi/v1/txt2img", self.base_url))
            .json(&Txt2ImgRequest::new(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StableDiffusionError::Status(response.status()));
        }

        let body: Txt2ImgResponse = response.json().await?;
        debug!(count = body.images.len(), "Images generated");
        Ok(body
            .images
            .iter()
            .map(|data| GeneratedImage::from_base64_png(data))
            .collect())
    }
}
