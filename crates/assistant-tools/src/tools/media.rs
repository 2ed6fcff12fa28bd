//! Media generation tools backed by the media capability service.
//!
//! Each tool posts a prompt to its endpoint and returns the URL of the
//! produced asset. Video and audio jobs run much longer than image jobs,
//! so each kind carries its own timeout.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Shared configuration for the media capability service.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Base URL of the media service.
    pub api_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
}

impl MediaConfig {
    /// Read configuration from `MEDIA_API_URL` and `MEDIA_API_KEY`.
    pub fn from_env() -> Result<Self, ToolError> {
        let api_url = env::var("MEDIA_API_URL")
            .map_err(|_| ToolError::ExecutionFailed("MEDIA_API_URL not set".to_string()))?;
        let api_key = env::var("MEDIA_API_KEY").unwrap_or_default();
        Ok(Self { api_url, api_key })
    }

    /// Create a config with explicit values.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

/// Response shape shared by all media endpoints.
#[derive(Debug, Deserialize)]
struct MediaResponse {
    url: String,
}

async fn post_media_job(
    config: &MediaConfig,
    path: &str,
    body: serde_json::Value,
    timeout: Duration,
) -> Result<String, ToolError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let url = format!("{}/{}", config.api_url.trim_end_matches('/'), path);

    debug!("Submitting media job to {}", url);

    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", config.api_key))
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        warn!("Media service returned {}: {}", status, text);
        return Err(ToolError::ExecutionFailed(format!(
            "media service returned status {status}"
        )));
    }

    let media: MediaResponse = response.json().await?;
    Ok(media.url)
}

/// Generates an image from a text prompt.
pub struct GenerateImage {
    config: MediaConfig,
}

impl GenerateImage {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Tool for GenerateImage {
    fn name(&self) -> &str {
        "generate_image"
    }

    fn description(&self) -> &str {
        "Generates a high-quality image from a text prompt."
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let prompt = args.get_string("prompt")?;
        let url = post_media_job(
            &self.config,
            "image",
            json!({ "prompt": prompt }),
            Duration::from_secs(60),
        )
        .await?;
        Ok(ToolOutput::success(prompt).with_media(url))
    }
}

/// Generates a video clip from a text prompt.
pub struct GenerateVideo {
    config: MediaConfig,
}

impl GenerateVideo {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Tool for GenerateVideo {
    fn name(&self) -> &str {
        "generate_video"
    }

    fn description(&self) -> &str {
        "Generates a cinematic video clip from a text prompt."
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let prompt = args.get_string("prompt")?;
        let url = post_media_job(
            &self.config,
            "video",
            json!({ "prompt": prompt }),
            Duration::from_secs(300),
        )
        .await?;
        Ok(ToolOutput::success(prompt).with_media(url))
    }
}

/// Generates music or audio from a text prompt.
pub struct GenerateAudio {
    config: MediaConfig,
}

impl GenerateAudio {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Tool for GenerateAudio {
    fn name(&self) -> &str {
        "generate_audio"
    }

    fn description(&self) -> &str {
        "Generates high-fidelity music or audio from a text prompt."
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let prompt = args.get_string("prompt")?;
        let duration = args.get_f64_or("duration", 30.0);
        let url = post_media_job(
            &self.config,
            "audio",
            json!({ "prompt": prompt, "duration": duration }),
            Duration::from_secs(180),
        )
        .await?;
        Ok(ToolOutput::success(prompt).with_media(url))
    }
}

/// Edits an existing image according to a prompt.
///
/// Requires the source image to be supplied in the parameters; locating
/// it in the current attachments or history is the caller's job.
pub struct ModifyImage {
    config: MediaConfig,
}

impl ModifyImage {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Tool for ModifyImage {
    fn name(&self) -> &str {
        "modify_image"
    }

    fn description(&self) -> &str {
        "Edits or transforms an existing image according to instructions."
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let prompt = args.get_string("prompt")?;
        let image_data = args.get_string("image_data")?;
        let mime_type = args
            .get_string_opt("mime_type")
            .unwrap_or_else(|| "image/png".to_string());

        let url = post_media_job(
            &self.config,
            "image/edit",
            json!({
                "prompt": prompt,
                "image": { "mimeType": mime_type, "data": image_data },
            }),
            Duration::from_secs(120),
        )
        .await?;
        Ok(ToolOutput::success(prompt).with_media(url))
    }
}
