use crate::agents::master_agent::MasterAgent;
use crate::error::*;
use crate::models::{FileEntry, StoredUpload};
use crate::types::{FileSize, MimeType};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// AppState && AiConfig
// ============================================================================

/// Provider settings shared by the chat agent and the image tools.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub api_base: String,
    pub chat_model: String,
    pub image_model: String,
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            api_base: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            chat_model: std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            image_model: std::env::var("IMAGE_MODEL")
                .unwrap_or_else(|_| "gpt-image-1".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub uploads: Arc<UploadStore>,
    pub outputs: Arc<OutputStore>,
    pub master_agent: Arc<MasterAgent>,
    pub ai_config: AiConfig,
}

// ============================================================================
// Upload store (local disk)
// ============================================================================

pub struct UploadStore {
    dir: PathBuf,
    max_size: FileSize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_size: FileSize) -> Self {
        Self {
            dir: dir.into(),
            max_size,
        }
    }

    /// Validate and persist one uploaded image. Files are stored under their
    /// content hash, so re-uploading the same bytes is idempotent.
    pub async fn save(&self, filename: &str, data: Bytes) -> Result<StoredUpload> {
        let mime_type = MimeType::new(
            mime_guess::from_path(filename)
                .first_or_octet_stream()
                .to_string(),
        );
        if !mime_type.is_allowed() {
            return Err(AppError::new(
                ErrorCode::UnsupportedMediaType,
                format!("File type {} is not allowed. Use PNG, JPG or WEBP", mime_type),
            ));
        }

        let size = FileSize::bytes(data.len() as u64);
        if size > self.max_size {
            return Err(AppError::new(
                ErrorCode::PayloadTooLarge,
                format!("File exceeds the {} upload limit", self.max_size),
            ));
        }

        // Rejects corrupt or mislabeled files before the edit tool sees them.
        image::load_from_memory(&data)?;

        let stored_name = format!(
            "{}.{}",
            compute_hash(&data),
            mime_type.extension().unwrap_or("png")
        );
        tokio::fs::write(self.dir.join(&stored_name), &data)
            .await
            .context("Failed to persist upload")?;

        Ok(StoredUpload {
            filename: stored_name,
            size,
            mime_type,
        })
    }

    pub fn url_for(&self, filename: &str) -> String {
        format!("/uploads/{}", filename)
    }
}

// ============================================================================
// Output store (generated and edited images)
// ============================================================================

pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All generated files, newest first.
    pub async fn list(&self) -> Result<Vec<FileEntry>> {
        let mut read_dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::from(e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .context("Failed to list outputs")?
        {
            let metadata = entry.metadata().await.context("Failed to list outputs")?;
            if !metadata.is_file() {
                continue;
            }

            let filename = entry.file_name().to_string_lossy().into_owned();
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            entries.push(FileEntry {
                url: self.url_for(&filename),
                filename,
                size: metadata.len(),
                modified,
            });
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(entries)
    }

    pub fn url_for(&self, filename: &str) -> String {
        format!("/outputs/{}", filename)
    }
}

fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ============================================================================
// Tests
// ============================================================================
