use axum::extract::{Multipart, State};
use axum::Json;
use std::sync::Arc;

use crate::error::*;
use crate::models::*;
use crate::AppState;

// ============================================================================
// Chat
// ============================================================================

/// POST /chat. One conversation turn through the master agent. Infallible
/// at the HTTP layer: agent problems come back as a text reply.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatReply> {
    let reply = state
        .master_agent
        .process(&request.message, request.image_url.as_deref())
        .await;
    Json(reply)
}

// ============================================================================
// Uploads and generated files
// ============================================================================

/// POST /upload. Accepts one multipart "image" field, stores it and makes it
/// the session's current image.
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Multipart: {}", e)))?
    {
        if field.name() == Some("image") {
            let filename = field
                .file_name()
                .ok_or_else(|| AppError::bad_request("Missing filename"))?
                .to_string();

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(format!("Read: {}", e)))?;

            let stored = state.uploads.save(&filename, data).await?;
            let url = state.uploads.url_for(&stored.filename);

            state.master_agent.set_current_image(url.clone()).await;
            log::info!("📤 Upload stored as {}", stored.filename);

            return Ok(Json(UploadResponse {
                filename: stored.filename,
                url,
                size: stored.size.as_bytes(),
                mime_type: stored.mime_type.as_str().to_string(),
            }));
        }
    }

    Err(AppError::validation("No image field in request"))
}

/// GET /files. Generated and edited images, newest first.
pub async fn files_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<FileEntry>>> {
    let entries = state.outputs.list().await?;
    Ok(Json(entries))
}

// ============================================================================
// Session
// ============================================================================

/// GET /history
pub async fn history_handler(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryEntry>> {
    Json(state.master_agent.history().await)
}

/// POST /clear. Drops the transcript and the current image.
pub async fn clear_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.master_agent.clear_session().await;
    Json(serde_json::json!({ "status": "cleared" }))
}

// ============================================================================
// Service meta
// ============================================================================

/// GET /health
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}

/// GET /info
pub async fn info_handler(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo::current(
        &state.ai_config.chat_model,
        &state.ai_config.image_model,
    ))
}
