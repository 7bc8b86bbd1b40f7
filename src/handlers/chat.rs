// src/handlers/chat.rs
use crate::handlers::error::ApiError;
use crate::types::ChatMessage;
use crate::AppState;
use axum::{
    extract::Extension,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: ChatMessage,
    pub messages: Vec<ChatMessage>,
}

pub fn chat_routes() -> Router {
    Router::new()
        .route("/api/chat", post(send_message))
        .route("/api/chat/history", get(get_history))
}

/// POST /api/chat - Send one message and wait for the model's reply
async fn send_message(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let exchange = state.chat.session().await.send(&request.message).await?;
    Ok(Json(ChatResponse {
        reply: exchange.reply,
        messages: exchange.messages,
    }))
}

/// GET /api/chat/history - Full conversation so far
async fn get_history(Extension(state): Extension<Arc<AppState>>) -> Json<Vec<ChatMessage>> {
    // Reading history does not start a session
    if !state.chat.is_started() {
        return Json(Vec::new());
    }
    Json(state.chat.session().await.history().await)
}
