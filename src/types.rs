use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// File Size Helper
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileSize(pub u64);

impl FileSize {
    pub const fn bytes(size: u64) -> Self {
        Self(size)
    }

    pub const fn megabytes(size: u64) -> Self {
        Self(size * 1024 * 1024)
    }

    pub fn as_bytes(&self) -> u64 {
        self.0
    }

    pub fn as_megabytes(&self) -> f64 {
        self.0 as f64 / (1024.0 * 1024.0)
    }

    pub fn human_readable(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = self.0 as f64;
        let mut unit_idx = 0;

        while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
            size /= 1024.0;
            unit_idx += 1;
        }

        format!("{:.1} {}", size, UNITS[unit_idx])
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.human_readable())
    }
}

impl From<u64> for FileSize {
    fn from(size: u64) -> Self {
        Self(size)
    }
}

// ============================================================================
// MIME Type Helper
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MimeType(String);

impl MimeType {
    /// Content types accepted by the upload endpoint.
    pub const ALLOWED_IMAGE_TYPES: &'static [&'static str] =
        &["image/png", "image/jpeg", "image/jpg", "image/webp"];

    pub fn new(mime: impl Into<String>) -> Self {
        Self(mime.into())
    }

    pub fn is_image(&self) -> bool {
        self.0.starts_with("image/")
    }

    pub fn is_allowed(&self) -> bool {
        Self::ALLOWED_IMAGE_TYPES.contains(&self.0.as_str())
    }

    pub fn extension(&self) -> Option<&str> {
        match self.0.as_str() {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MimeType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MimeType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// URL Validation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Url(String);

impl Url {
    pub fn new(url: impl Into<String>) -> std::result::Result<Self, String> {
        let url = url.into();
        if Self::is_valid(&url) {
            Ok(Self(url))
        } else {
            Err("Invalid URL".to_string())
        }
    }

    pub fn is_valid(url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_size() {
        let size = FileSize::megabytes(5);
        assert_eq!(size.as_bytes(), 5 * 1024 * 1024);
        assert!(size.human_readable().contains("MB"));
    }

    #[test]
    fn test_file_size_display() {
        let size = FileSize::bytes(512);
        assert_eq!(format!("{}", size), "512.0 B");
    }

    #[test]
    fn test_mime_type_allowlist() {
        assert!(MimeType::new("image/png").is_allowed());
        assert!(MimeType::new("image/webp").is_allowed());
        assert!(!MimeType::new("image/gif").is_allowed());
        assert!(!MimeType::new("application/pdf").is_allowed());
    }

    #[test]
    fn test_mime_type() {
        let mime = MimeType::new("image/jpeg");
        assert!(mime.is_image());
        assert!(mime.is_allowed());
        assert_eq!(mime.extension(), Some("jpg"));
    }

    #[test]
    fn test_url_validation() {
        assert!(Url::is_valid("https://example.com"));
        assert!(Url::is_valid("http://localhost:8000/uploads/a.png"));
        assert!(!Url::is_valid("uploads/a.png"));
        assert!(Url::new("not-a-url").is_err());

        let url = Url::new("https://example.com/cat.png").unwrap();
        assert_eq!(url.as_str(), "https://example.com/cat.png");
        assert_eq!(format!("{}", url), "https://example.com/cat.png");
    }
}
