use rig::completion::ToolDefinition;
use rig::tool::Tool;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{classify_provider_error, decode_image_payload, save_output_image, snippet, ToolFailure};
use crate::storage::AiConfig;
use crate::types::Url;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditImageArgs {
    /// URL or path of the image to edit, as announced in the conversation.
    pub image_url: String,
    /// What to change, stated specifically. Good: "Add red sunglasses to the
    /// person's face". Bad: "Make it better".
    pub edit_instructions: String,
}

/// Re-renders an existing image per text instructions via the images/edits
/// endpoint. The source may be a full URL or a server-local path.
#[derive(Clone)]
pub struct EditImage {
    http: reqwest::Client,
    config: AiConfig,
    output_dir: PathBuf,
}

impl EditImage {
    pub fn new(http: reqwest::Client, config: AiConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            config,
            output_dir: output_dir.into(),
        }
    }

    async fn run(&self, args: &EditImageArgs) -> Result<String, ToolFailure> {
        if args.image_url.is_empty() {
            return Ok("Error: Image URL not provided.".to_string());
        }

        log::info!("✏️  Editing image: {}", args.image_url);
        log::debug!("Edit instructions: {}", snippet(&args.edit_instructions, 50));

        let source = self.load_source(&args.image_url).await?;
        let png = normalize_to_rgba_png(&source)?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.config.image_model.clone())
            .text("prompt", args.edit_instructions.clone())
            .text("n", "1")
            .text("size", "1024x1024")
            .part(
                "image",
                reqwest::multipart::Part::bytes(png)
                    .file_name("image.png")
                    .mime_str("image/png")?,
            );

        let response = self
            .http
            .post(format!("{}/images/edits", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_provider_error(status, &body));
        }

        let bytes = decode_image_payload(&body)?;
        let filename = edited_filename(&args.image_url);
        let path = save_output_image(&self.output_dir, &filename, &bytes).await?;
        log::info!("✅ Edited image saved to {}", path.display());

        Ok(format!(
            "Image edited successfully! Changes made: {}... [IMAGE_PATH:{}]",
            snippet(&args.edit_instructions, 100),
            path.display()
        ))
    }

    /// Fetch the source image. Anything that is not an http(s) URL is treated
    /// as a path under the server working directory, so the "/uploads/..."
    /// references produced by the upload endpoint resolve too.
    async fn load_source(&self, image_url: &str) -> Result<Vec<u8>, ToolFailure> {
        match Url::new(image_url) {
            Ok(url) => {
                let response = self
                    .http
                    .get(url.as_str())
                    .timeout(DOWNLOAD_TIMEOUT)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
            Err(_) => Ok(tokio::fs::read(image_url.trim_start_matches('/')).await?),
        }
    }
}

/// Re-encode to RGBA PNG, which the edit endpoint accepts for every source
/// format we allow.
fn normalize_to_rgba_png(data: &[u8]) -> Result<Vec<u8>, ToolFailure> {
    let img = image::load_from_memory(data).map_err(|_| ToolFailure::UnsupportedImage)?;
    let rgba = image::DynamicImage::ImageRgba8(img.to_rgba8());
    let mut buffer = Vec::new();
    rgba.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(buffer)
}

/// Keep the original stem so edited files stay recognizable.
fn edited_filename(image_url: &str) -> String {
    let stem = Path::new(image_url)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    format!("{}_edited_{}.png", stem, chrono::Local::now().format("%H%M%S"))
}

fn failure_text(err: &ToolFailure) -> String {
    match err {
        ToolFailure::ContentPolicy => {
            "Image editing failed: The edit request was blocked by content policy.".to_string()
        }
        other => format!("Image editing failed: {}", other),
    }
}

impl Tool for EditImage {
    const NAME: &'static str = "edit_image";

    type Error = std::convert::Infallible;
    type Args = EditImageArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Edit an existing image based on text instructions. \
                          Use when the user wants to modify, change, fix or add to \
                          an image they already uploaded or generated."
                .to_string(),
            parameters: schema_for!(EditImageArgs).to_value(),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        match self.run(&args).await {
            Ok(text) => Ok(text),
            Err(err) => {
                log::error!("❌ Image editing failed: {}", err);
                Ok(failure_text(&err))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> AiConfig {
        AiConfig {
            api_key: "sk-test".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            chat_model: "gpt-4o".to_string(),
            image_model: "gpt-image-1".to_string(),
        }
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0]));
        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[tokio::test]
    async fn test_empty_image_url_is_polite_text() {
        let tool = EditImage::new(reqwest::Client::new(), unreachable_config(), "outputs");
        let args = EditImageArgs {
            image_url: String::new(),
            edit_instructions: "add a hat".to_string(),
        };
        let text = tool.call(args).await.unwrap();
        assert_eq!(text, "Error: Image URL not provided.");
    }

    #[tokio::test]
    async fn test_missing_local_file_reports_failure_text() {
        let tool = EditImage::new(reqwest::Client::new(), unreachable_config(), "outputs");
        let args = EditImageArgs {
            image_url: "uploads/definitely_missing.png".to_string(),
            edit_instructions: "add a hat".to_string(),
        };
        let text = tool.call(args).await.unwrap();
        assert!(text.starts_with("Image editing failed:"));
    }

    #[test]
    fn test_edited_filename_preserves_stem() {
        let name = edited_filename("/uploads/photo.png");
        assert!(name.starts_with("photo_edited_"));
        assert!(name.ends_with(".png"));

        let name = edited_filename("http://localhost:8000/uploads/cat.jpg");
        assert!(name.starts_with("cat_edited_"));
    }

    #[test]
    fn test_normalize_produces_rgba_png() {
        let png = normalize_to_rgba_png(&tiny_png()).unwrap();
        assert_eq!(
            image::guess_format(&png).unwrap(),
            image::ImageFormat::Png
        );
        let reloaded = image::load_from_memory(&png).unwrap();
        assert_eq!(reloaded.width(), 2);
        assert_eq!(reloaded.height(), 2);
    }

    #[test]
    fn test_normalize_rejects_non_image_data() {
        let failure = normalize_to_rgba_png(b"definitely not an image").unwrap_err();
        assert!(matches!(failure, ToolFailure::UnsupportedImage));
    }

    #[test]
    fn test_content_policy_failure_has_shorter_message() {
        assert_eq!(
            failure_text(&ToolFailure::ContentPolicy),
            "Image editing failed: The edit request was blocked by content policy."
        );
        assert_eq!(
            failure_text(&ToolFailure::RateLimited),
            "Image editing failed: Rate limit reached. Please wait a moment and try again."
        );
    }
}
