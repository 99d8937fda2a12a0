use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::Display;

// ============================================================================
// Main Error Type
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    // Convenience constructors
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("{} not found", resource.into()),
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

// ============================================================================
// Error Codes
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (4xx)
    BadRequest,
    NotFound,
    ValidationError,
    PayloadTooLarge,
    UnsupportedMediaType,

    // Server errors (5xx)
    Internal,
    StorageError,
    ImageProcessingError,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::ValidationError => 422,
            Self::PayloadTooLarge => 413,
            Self::UnsupportedMediaType => 415,
            Self::Internal => 500,
            Self::StorageError => 500,
            Self::ImageProcessingError => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }

    pub fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

pub type Result<T> = std::result::Result<T, AppError>;

// ============================================================================
// Error Response for HTTP
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: AppError,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: AppError) -> Self {
        Self {
            error,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// ============================================================================
// Error Conversion Implementations
// ============================================================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorCode::StorageError, format!("IO error: {}", err))
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        Self::new(
            ErrorCode::ImageProcessingError,
            format!("Invalid image: {}", err),
        )
    }
}

// ============================================================================
// Backend-specific HTTP Response Conversion
// ============================================================================

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        log_error(&self);

        let status = StatusCode::from_u16(self.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let response = ErrorResponse::new(self);

        (status, Json(response)).into_response()
    }
}

// ============================================================================
// Error Context Extension
// ============================================================================

pub trait ErrorContext<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<AppError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let mut err = e.into();
            err.message = format!("{}: {}", context.into(), err.message);
            err
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn log_error(error: &AppError) {
    if error.code.is_server_error() {
        log::error!("{}", error);
    } else {
        log::warn!("{}", error);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = AppError::not_found("Upload");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("Upload"));
    }

    #[test]
    fn test_error_with_details() {
        let err = AppError::validation("Invalid input")
            .with_details(serde_json::json!({"field": "image"}));
        assert!(err.details.is_some());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), 404);
        assert_eq!(ErrorCode::PayloadTooLarge.http_status(), 413);
        assert_eq!(ErrorCode::UnsupportedMediaType.http_status(), 415);
        assert_eq!(ErrorCode::Internal.http_status(), 500);
    }

    #[test]
    fn test_error_classification() {
        assert!(ErrorCode::BadRequest.is_client_error());
        assert!(ErrorCode::StorageError.is_server_error());
        assert!(ErrorCode::ImageProcessingError.is_server_error());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::not_found("Resource");
        let display = format!("{}", err);
        assert!(display.contains("NOT_FOUND"));
        assert!(display.contains("Resource"));
    }

    #[test]
    fn test_json_serialization() {
        let err = AppError::bad_request("Invalid data");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("BAD_REQUEST"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::from(io_err);
        assert_eq!(err.code, ErrorCode::StorageError);
        assert!(err.message.contains("denied"));
    }

    #[test]
    fn test_error_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = result.context("Failed to list outputs").unwrap_err();
        assert!(err.message.starts_with("Failed to list outputs:"));
        assert!(err.message.contains("missing"));
    }
}
