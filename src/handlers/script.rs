// src/handlers/script.rs
use crate::error::ScriptError;
use crate::handlers::error::ApiError;
use crate::script::{decode_upload, is_supported};
use crate::storyboard::StoryboardState;
use crate::AppState;
use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, Extension},
    response::Json,
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

const MAX_SCRIPT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Deserialize)]
pub struct ScriptRequest {
    pub script: String,
}

pub fn script_routes() -> Router {
    Router::new()
        .route("/api/script", post(set_script))
        .route("/api/script/upload", post(upload_script))
        .layer(DefaultBodyLimit::max(MAX_SCRIPT_BYTES))
}

/// POST /api/script - Replace the script with raw text
async fn set_script(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ScriptRequest>,
) -> Result<Json<StoryboardState>, ApiError> {
    let state = state.orchestrator.load_script(request.script).await?;
    Ok(Json(state))
}

/// POST /api/script/upload - Replace the script with the first uploaded file
async fn upload_script(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StoryboardState>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::BadRequest(format!("Invalid multipart body: {}", e))
    })? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);

        // Refuse before buffering the body
        if !is_supported(Some(&filename), content_type.as_deref()) {
            tracing::warn!(filename = %filename, "Rejected script upload with unsupported type");
            return Err(ScriptError::UnsupportedType(filename).into());
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

        tracing::info!(
            filename = %filename,
            size_bytes = data.len(),
            "📁 Script upload received"
        );

        let script = decode_upload(Some(&filename), content_type.as_deref(), data.to_vec())?;
        let state = state.orchestrator.load_script(script).await?;
        return Ok(Json(state));
    }

    Err(ScriptError::MissingFile.into())
}
