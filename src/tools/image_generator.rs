use rig::completion::ToolDefinition;
use rig::tool::Tool;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use std::path::PathBuf;
use uuid::Uuid;

use super::{classify_provider_error, decode_image_payload, save_output_image, snippet, ToolFailure};
use crate::storage::AiConfig;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateImageArgs {
    /// Detailed description of what the image should show.
    pub prompt: String,
    /// Image dimensions such as "1024x1024" (default), "1536x1024" or "1024x1536".
    #[serde(default)]
    pub size: Option<String>,
    /// Rendering quality: "low", "medium" or "high" (default).
    #[serde(default)]
    pub quality: Option<String>,
}

/// Creates a brand new image from a text prompt via the images/generations
/// endpoint and saves the result into the output directory.
#[derive(Clone)]
pub struct GenerateImage {
    http: reqwest::Client,
    config: AiConfig,
    output_dir: PathBuf,
}

impl GenerateImage {
    pub fn new(http: reqwest::Client, config: AiConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            config,
            output_dir: output_dir.into(),
        }
    }

    async fn run(&self, args: &GenerateImageArgs) -> Result<String, ToolFailure> {
        let size = args.size.as_deref().unwrap_or("1024x1024");
        let quality = args.quality.as_deref().unwrap_or("high");
        log::info!("🎨 Generating image: {}", snippet(&args.prompt, 80));

        let response = self
            .http
            .post(format!("{}/images/generations", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({
                "model": self.config.image_model,
                "prompt": args.prompt,
                "n": 1,
                "size": size,
                "quality": quality,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_provider_error(status, &body));
        }

        let bytes = decode_image_payload(&body)?;
        let path = save_output_image(&self.output_dir, &generated_filename(), &bytes).await?;
        log::info!("✅ Image saved to {}", path.display());

        Ok(format!(
            "Image generated successfully! The image shows: {}... [IMAGE_PATH:{}]",
            snippet(&args.prompt, 100),
            path.display()
        ))
    }
}

fn generated_filename() -> String {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let id = Uuid::new_v4().simple().to_string();
    format!("generated_{}_{}.png", stamp, &id[..8])
}

impl Tool for GenerateImage {
    const NAME: &'static str = "generate_image";

    type Error = std::convert::Infallible;
    type Args = GenerateImageArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Generate a brand new image from a text description. \
                          Use when the user asks to create, draw, generate or make a picture."
                .to_string(),
            parameters: schema_for!(GenerateImageArgs).to_value(),
        }
    }

    // Failures are reported as text so the agent can relay them to the user
    // instead of aborting the whole turn.
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        match self.run(&args).await {
            Ok(text) => Ok(text),
            Err(err) => {
                log::error!("❌ Image generation failed: {}", err);
                Ok(format!("Image generation failed: {}", err))
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

    #[test]
    fn test_generated_filename_shape() {
        let name = generated_filename();
        assert!(name.starts_with("generated_"));
        assert!(name.ends_with(".png"));
        // generated_YYYYMMDD_HHMMSS_xxxxxxxx.png
        assert_eq!(name.len(), 38);
    }

    #[test]
    fn test_generated_filenames_are_unique() {
        assert_ne!(generated_filename(), generated_filename());
    }

    #[tokio::test]
    async fn test_definition_lists_parameters() {
        let tool = GenerateImage::new(reqwest::Client::new(), unreachable_config(), "outputs");
        let def = tool.definition(String::new()).await;
        assert_eq!(def.name, "generate_image");
        let props = &def.parameters["properties"];
        assert!(props.get("prompt").is_some());
        assert!(props.get("size").is_some());
        assert!(props.get("quality").is_some());
    }

    #[tokio::test]
    async fn test_call_reports_failure_as_text() {
        let tool = GenerateImage::new(reqwest::Client::new(), unreachable_config(), "outputs");
        let args = GenerateImageArgs {
            prompt: "a cat".to_string(),
            size: None,
            quality: None,
        };
        let text = tool.call(args).await.unwrap();
        assert!(text.starts_with("Image generation failed:"));
    }
}
