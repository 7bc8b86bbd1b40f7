// src/handlers/error.rs
use crate::chat::ChatError;
use crate::error::ScriptError;
use crate::storyboard::{GenerateError, Rejection};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// JSON body returned for error responses
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// HTTP-layer error mapping each domain failure to a status code
#[derive(Debug)]
pub enum ApiError {
    Generate(GenerateError),
    Script(ScriptError),
    Chat(ChatError),
    BadRequest(String),
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        Self::Generate(err)
    }
}

impl From<Rejection> for ApiError {
    fn from(err: Rejection) -> Self {
        Self::Generate(GenerateError::Rejected(err))
    }
}

impl From<ScriptError> for ApiError {
    fn from(err: ScriptError) -> Self {
        Self::Script(err)
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self::Chat(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Generate(GenerateError::Rejected(Rejection::EmptyScript)) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                Rejection::EmptyScript.to_string(),
            ),
            ApiError::Generate(GenerateError::Rejected(Rejection::Busy)) => {
                (StatusCode::CONFLICT, "busy", Rejection::Busy.to_string())
            }
            ApiError::Generate(err @ GenerateError::Extraction { .. }) => {
                (StatusCode::BAD_GATEWAY, "extraction_failed", err.to_string())
            }
            ApiError::Script(ScriptError::UnsupportedType(name)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_file_type",
                format!("Unsupported file type: {}. Upload a .txt or .md file.", name),
            ),
            ApiError::Script(err) => (StatusCode::BAD_REQUEST, "invalid_script", err.to_string()),
            ApiError::Chat(err) => (StatusCode::BAD_REQUEST, "validation_error", err.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
        };

        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}
