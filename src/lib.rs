// lib.rs - Main library file that exports all modules
pub mod chat;
pub mod config;
pub mod error;
pub mod gemini_client;
pub mod handlers;
pub mod middleware;
pub mod provider;
pub mod script;
pub mod storyboard;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use types::*;

/// Model names reported by `/api/status`
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub text: String,
    pub image: String,
    pub chat: String,
}

impl From<&config::AppConfig> for ModelInfo {
    fn from(config: &config::AppConfig) -> Self {
        Self {
            text: config.text_model.clone(),
            image: config.image_model.clone(),
            chat: config.chat_model.clone(),
        }
    }
}

// AppState holds the storyboard orchestrator and the lazily started chat session,
// both backed by the same provider
pub struct AppState {
    pub orchestrator: storyboard::StoryboardOrchestrator,
    pub chat: chat::SharedChat,
    pub models: ModelInfo,
}

impl AppState {
    pub fn new(provider: Arc<dyn provider::GenerativeProvider>, models: ModelInfo) -> Self {
        Self {
            orchestrator: storyboard::StoryboardOrchestrator::new(provider.clone()),
            chat: chat::SharedChat::new(provider),
            models,
        }
    }
}

/// Build the application with all routes and shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::script::script_routes())
        .merge(handlers::storyboard::storyboard_routes())
        .merge(handlers::chat::chat_routes())
        .merge(handlers::status::status_routes())
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
