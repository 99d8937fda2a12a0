pub mod image_editor;
pub mod image_generator;
pub mod websearch;

pub use image_editor::EditImage;
pub use image_generator::GenerateImage;
pub use websearch::WebSearch;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared tool plumbing
// ============================================================================

/// What went wrong while a tool talked to the image or search provider.
///
/// The user-facing variants render as complete sentences so tools can embed
/// them directly in the text they hand back to the agent.
#[derive(Debug, thiserror::Error)]
pub enum ToolFailure {
    #[error("Rate limit reached. Please wait a moment and try again.")]
    RateLimited,

    #[error("The request was blocked by content policy. Please try a different prompt.")]
    ContentPolicy,

    #[error("Invalid API key. Please check your OpenAI API key.")]
    InvalidApiKey,

    #[error("The image format is not supported. Please use PNG, JPG, or WEBP.")]
    UnsupportedImage,

    #[error("{0}")]
    Provider(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not read image data: {0}")]
    Io(#[from] std::io::Error),

    #[error("image payload was not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("unexpected response shape: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error: ProviderErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Map a non-success provider response to a [`ToolFailure`].
///
/// OpenAI reports the interesting part in `error.code` / `error.type`, but
/// some gateways only echo it in the message, so all three are scanned.
pub fn classify_provider_error(status: reqwest::StatusCode, body: &str) -> ToolFailure {
    let parsed: ProviderErrorBody = serde_json::from_str(body).unwrap_or_default();
    let detail = parsed.error;
    let haystack = format!(
        "{} {} {}",
        detail.message,
        detail.code.as_deref().unwrap_or(""),
        detail.kind.as_deref().unwrap_or("")
    )
    .to_lowercase();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || haystack.contains("rate_limit") {
        return ToolFailure::RateLimited;
    }
    if haystack.contains("content_policy") {
        return ToolFailure::ContentPolicy;
    }
    if status == reqwest::StatusCode::UNAUTHORIZED || haystack.contains("invalid_api_key") {
        return ToolFailure::InvalidApiKey;
    }

    if detail.message.is_empty() {
        ToolFailure::Provider(format!("HTTP {}: {}", status, snippet(body, 200)))
    } else {
        ToolFailure::Provider(detail.message)
    }
}

#[derive(Debug, Deserialize)]
struct ImagePayload {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

/// Extract the base64 image from a successful generations/edits response.
pub fn decode_image_payload(body: &str) -> Result<Vec<u8>, ToolFailure> {
    let payload: ImagePayload = serde_json::from_str(body)?;
    let first = payload
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ToolFailure::Provider("image API returned no data".to_string()))?;
    let b64 = first
        .b64_json
        .ok_or_else(|| ToolFailure::Provider("image API returned no b64_json payload".to_string()))?;
    Ok(BASE64.decode(b64)?)
}

pub async fn save_output_image(
    dir: &Path,
    filename: &str,
    bytes: &[u8],
) -> Result<PathBuf, ToolFailure> {
    let path = dir.join(filename);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// First `max_chars` characters of `text`. Safe on multi-byte input.
pub fn snippet(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ============================================================================
// Tests
// ============================================================================
