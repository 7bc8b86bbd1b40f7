// src/handlers/storyboard.rs
use crate::handlers::error::ApiError;
use crate::storyboard::StoryboardState;
use crate::AppState;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn storyboard_routes() -> Router {
    Router::new()
        .route("/api/storyboard", get(get_storyboard))
        .route("/api/storyboard/generate", post(generate_storyboard))
}

/// GET /api/storyboard - Current script, storyboard and loading state
async fn get_storyboard(Extension(state): Extension<Arc<AppState>>) -> Json<StoryboardState> {
    Json(state.orchestrator.snapshot().await)
}

/// POST /api/storyboard/generate - Extract scenes and start image generation.
///
/// Responds once placeholders exist; the run keeps going on its own task even
/// if the client disconnects, and images show up through `GET /api/storyboard`.
async fn generate_storyboard(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<(StatusCode, Json<StoryboardState>), ApiError> {
    let run = state.orchestrator.start().await?;
    Ok((StatusCode::ACCEPTED, Json(run.placeholders)))
}
