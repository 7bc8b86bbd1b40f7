//! Shared helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use storyboard_studio::testing::ScriptedProvider;
use storyboard_studio::{build_router, AppState, ModelInfo};
use tower::ServiceExt;

/// Build the full app router around a scripted provider
pub fn build_test_app(provider: ScriptedProvider) -> (Router, Arc<AppState>, Arc<ScriptedProvider>) {
    let provider = Arc::new(provider);
    let models = ModelInfo {
        text: "test-text".to_string(),
        image: "test-image".to_string(),
        chat: "test-chat".to_string(),
    };
    let state = Arc::new(AppState::new(provider.clone(), models));
    (build_router(state.clone()), state, provider)
}

async fn into_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };
    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    into_json(app.oneshot(request).await.unwrap()).await
}

/// Send a POST request without a body.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    into_json(app.oneshot(request).await.unwrap()).await
}

/// Upload a single file as multipart/form-data.
pub async fn post_file(
    app: Router,
    uri: &str,
    filename: &str,
    content_type: &str,
    contents: &[u8],
) -> (StatusCode, serde_json::Value) {
    let boundary = "storyboard-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    // Streamed in chunks like a real upload, so part headers arrive first
    let chunks: Vec<Result<Bytes, std::io::Error>> = body
        .chunks(64 * 1024)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();

    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from_stream(futures::stream::iter(chunks)))
        .unwrap();

    into_json(app.oneshot(request).await.unwrap()).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    into_json(app.oneshot(request).await.unwrap()).await
}

/// Poll the storyboard until generation finishes.
pub async fn wait_until_settled(app: Router) -> serde_json::Value {
    for _ in 0..200 {
        let (_, json) = get_json(app.clone(), "/api/storyboard").await;
        if json["isLoading"] == false {
            return json;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("storyboard generation did not settle");
}
