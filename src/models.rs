use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::types::{FileSize, MimeType};

/// Service name reported by /health and /info.
pub const SERVICE_NAME: &str = "Sarvo AI Agent Chatbot";

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReplyKind {
    Text,
    Image,
}

/// A classified agent reply. Build via [`ChatReply::text`] or
/// [`ChatReply::image`]; `image_url` is present exactly for image replies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ChatReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Text,
            content: content.into(),
            image_url: None,
        }
    }

    pub fn image(content: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Image,
            content: content.into(),
            image_url: Some(image_url.into()),
        }
    }
}

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// Uploads & Generated Files
// ============================================================================

/// Result of persisting a validated upload to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUpload {
    pub filename: String,
    pub size: FileSize,
    pub mime_type: MimeType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

// ============================================================================
// Health & Info
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub capabilities: Vec<String>,
    pub models: ModelCatalog,
    pub endpoints: EndpointCatalog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub chat: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointCatalog {
    pub chat: String,
    pub upload: String,
    pub history: String,
    pub clear: String,
    pub files: String,
}

impl ServiceInfo {
    pub fn current(chat_model: &str, image_model: &str) -> Self {
        Self {
            name: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            capabilities: vec![
                "chat".to_string(),
                "image_generation".to_string(),
                "image_editing".to_string(),
                "web_search".to_string(),
            ],
            models: ModelCatalog {
                chat: chat_model.to_string(),
                image: image_model.to_string(),
            },
            endpoints: EndpointCatalog {
                chat: "POST /chat".to_string(),
                upload: "POST /upload".to_string(),
                history: "GET /history".to_string(),
                clear: "POST /clear".to_string(),
                files: "GET /files".to_string(),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
