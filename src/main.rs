use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use sarvo_agent::handlers::{
    chat_handler, clear_handler, files_handler, health_check, history_handler, info_handler,
    upload_handler,
};
use sarvo_agent::init::{app_init, Config};
use sarvo_agent::AppState;

fn create_app_router(config: &Config, state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", axum::routing::post(chat_handler))
        .route("/upload", axum::routing::post(upload_handler))
        .route("/history", axum::routing::get(history_handler))
        .route("/clear", axum::routing::post(clear_handler))
        .route("/files", axum::routing::get(files_handler))
        .route("/health", axum::routing::get(health_check))
        .route("/info", axum::routing::get(info_handler))
        .nest_service("/outputs", ServeDir::new(&config.output_dir))
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(DefaultBodyLimit::max(config.max_upload.as_bytes() as usize))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // DEBUG=true turns on debug logging unless RUST_LOG says otherwise.
    let default_level = if std::env::var("DEBUG")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(true)
    {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    log::info!("🚀 Starting Sarvo AI Agent Chatbot...");
    let (config, state) = app_init().await?;
    log::info!("✅ Application state initialized");

    let chat_model = state.ai_config.chat_model.clone();
    let image_model = state.ai_config.image_model.clone();
    let app = create_app_router(&config, state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("");
    log::info!("🎉 Server started!");
    log::info!("📍 http://{}", addr);
    log::info!("💬 Chat: http://{}/chat", addr);
    log::info!("📤 Upload: http://{}/upload", addr);
    log::info!("🖼️  Outputs: http://{}/outputs", addr);
    log::info!("❤️  Health: http://{}/health", addr);
    log::info!("");
    log::info!("🧠 Chat model: {}", chat_model);
    log::info!("🎨 Image model: {}", image_model);
    log::info!("📦 Upload limit: {}", config.max_upload);
    log::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
