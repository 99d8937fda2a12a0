use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use crate::storage::{OutputStore, UploadStore};
use crate::types::FileSize;
use crate::{AiConfig, AppState, MasterAgent};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_upload: FileSize,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_or("PORT", "8000").parse()?,
            debug: env_or("DEBUG", "true").to_lowercase() == "true",
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", "outputs")),
            max_upload: FileSize::megabytes(env_or("MAX_FILE_SIZE_MB", "50").parse()?),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Settings problems worth telling the operator about. None of them stop
/// the server; the provider will simply reject calls until they are fixed.
pub fn validate_config(ai: &AiConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if ai.api_key.is_empty() {
        warnings.push("OPENAI_API_KEY is not set; provider calls will fail".to_string());
    } else if !ai.api_key.starts_with("sk-") {
        warnings.push("OPENAI_API_KEY doesn't look valid (should start with 'sk-')".to_string());
    }

    warnings
}

pub async fn app_init() -> Result<(Config, Arc<AppState>), Box<dyn Error>> {
    let config = Config::from_env()?;
    log::info!("✅ Configuration loaded");
    let ai_config = AiConfig::from_env();
    log::info!("✅ Ai Configuration loaded");

    for warning in validate_config(&ai_config) {
        log::warn!("⚠️  {}", warning);
    }

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.output_dir).await?;
    log::info!(
        "📁 Directories ready: {} and {}",
        config.upload_dir.display(),
        config.output_dir.display()
    );

    let uploads = Arc::new(UploadStore::new(
        config.upload_dir.clone(),
        config.max_upload,
    ));
    let outputs = Arc::new(OutputStore::new(config.output_dir.clone()));

    let master_agent = Arc::new(MasterAgent::new(&ai_config, config.output_dir.clone())?);
    log::info!(
        "🤖 Agent ready (chat: {}, image: {})",
        ai_config.chat_model,
        ai_config.image_model
    );

    let state = Arc::new(AppState {
        uploads,
        outputs,
        master_agent,
        ai_config,
    });
    Ok((config, state))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: &str) -> AiConfig {
        AiConfig {
            api_key: key.to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o".to_string(),
            image_model: "gpt-image-1".to_string(),
        }
    }

    #[test]
    fn test_validate_flags_missing_key() {
        let warnings = validate_config(&config_with_key(""));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not set"));
    }

    #[test]
    fn test_validate_flags_odd_looking_key() {
        let warnings = validate_config(&config_with_key("my-key"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("should start with 'sk-'"));
    }

    #[test]
    fn test_validate_accepts_normal_key() {
        assert!(validate_config(&config_with_key("sk-abc123")).is_empty());
    }
}
