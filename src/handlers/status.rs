// src/handlers/status.rs
use crate::AppState;
use axum::{extract::Extension, response::Html, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn status_routes() -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/docs", get(api_documentation))
}

// API Status endpoint
async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let storyboard = state.orchestrator.snapshot().await;

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "models": {
            "text": state.models.text,
            "image": state.models.image,
            "chat": state.models.chat
        },
        "storyboard": {
            "has_script": !storyboard.script.trim().is_empty(),
            "generating": storyboard.is_loading,
            "scenes": storyboard.storyboard.len(),
            "pending_images": storyboard.pending_count()
        },
        "chat": {
            "session_started": state.chat.is_started()
        },
        "endpoints": {
            "documentation": "/api/docs",
            "status": "/api/status",
            "script": "/api/script",
            "storyboard": "/api/storyboard",
            "chat": "/api/chat"
        }
    }))
}

// API Documentation endpoint
async fn api_documentation() -> Html<&'static str> {
    Html(
        r###"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Storyboard Studio - API</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 900px; margin: 0 auto; padding: 20px; line-height: 1.6; }
        .endpoint { background: #f8f9fa; border-left: 4px solid #007bff; padding: 1rem; margin: 1rem 0; border-radius: 5px; }
        code { background: #e9ecef; padding: 0.2rem 0.4rem; border-radius: 3px; }
    </style>
</head>
<body>
    <h1>🎬 Storyboard Studio API</h1>

    <h2>1. Your Script</h2>
    <div class="endpoint"><strong>POST /api/script</strong><br>Body: <code>{"script": "..."}</code></div>
    <div class="endpoint"><strong>POST /api/script/upload</strong><br>multipart/form-data with one <code>.txt</code> or <code>.md</code> file</div>

    <h2>2. Generate Storyboard</h2>
    <div class="endpoint"><strong>POST /api/storyboard/generate</strong><br>Returns <code>202</code> with one placeholder per scene; images fill in asynchronously</div>
    <div class="endpoint"><strong>GET /api/storyboard</strong><br>Each item's <code>imageUrl</code> is <code>null</code> while loading, <code>"error"</code> if that scene failed, or a data URI</div>

    <h2>Chat</h2>
    <div class="endpoint"><strong>POST /api/chat</strong><br>Body: <code>{"message": "..."}</code></div>
    <div class="endpoint"><strong>GET /api/chat/history</strong></div>

    <h2>System</h2>
    <div class="endpoint"><strong>GET /api/status</strong></div>
</body>
</html>
"###,
    )
}
