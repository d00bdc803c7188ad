//! In-process mock of the analysis service for HTTP tests.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::ApiClient;

/// One multipart field as seen by the mock server.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPart {
    pub field: String,
    pub file_name: Option<String>,
    pub len: usize,
    pub text: Option<String>,
}

#[derive(Clone, Default)]
pub struct MockState {
    pub uploads: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
    pub auth: Arc<Mutex<Vec<Option<String>>>>,
}

async fn record_auth(state: &MockState, headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.auth.lock().await.push(value.clone());
    value
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn groups() -> Json<Vec<&'static str>> {
    Json(vec!["Group1", "Group2"])
}

async fn group(Path(group): Path<String>) -> Response {
    if group == "Group1" {
        Json(vec!["videos", "jsons"]).into_response()
    } else {
        detail(StatusCode::NOT_FOUND, "Group not found")
    }
}

async fn group_files(Path((group, folder)): Path<(String, String)>) -> Json<serde_json::Value> {
    Json(json!([
        { "id": format!("{group}-{folder}-1"), "filename": format!("{folder}_1.bin") },
        { "id": format!("{group}-{folder}-2"), "filename": format!("{folder}_2.bin") },
    ]))
}

async fn videos(State(state): State<MockState>, headers: HeaderMap) -> Response {
    match record_auth(&state, &headers).await.as_deref() {
        Some("Bearer tok-1") => {
            Json(json!([{ "video_id": "v1", "filename": "run.mp4" }])).into_response()
        }
        _ => detail(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

async fn file(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_auth(&state, &headers).await;
    match id.as_str() {
        "missing" => detail(StatusCode::NOT_FOUND, "File not found"),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => (
            [(CONTENT_TYPE, "application/octet-stream")],
            format!("payload-{id}"),
        )
            .into_response(),
    }
}

async fn stream_video(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match record_auth(&state, &headers).await.as_deref() {
        Some("Bearer tok-1") => ([(CONTENT_TYPE, "video/mp4")], format!("frames-{id}")).into_response(),
        _ => detail(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

async fn process(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    record_auth(&state, &headers).await;
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.unwrap_or_default();
        let text = file_name
            .is_none()
            .then(|| String::from_utf8_lossy(&data).into_owned());
        parts.push(ReceivedPart {
            field: name,
            file_name,
            len: data.len(),
            text,
        });
    }
    let rejected = parts
        .iter()
        .any(|p| p.file_name.as_deref().is_some_and(|n| n.starts_with("reject")));
    state.uploads.lock().await.push(parts);
    if rejected {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Unsupported video");
    }
    Json(json!({ "video_id": 7, "status": "processed" })).into_response()
}

/// Starts the mock service on an ephemeral port and returns its base URL.
pub async fn spawn_server() -> (String, MockState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = MockState::default();
    let app = Router::new()
        .route("/groups/", get(groups))
        .route("/groups/:group/", get(group))
        .route("/groups/:group/:folder/", get(group_files))
        .route("/videoFiles/", get(videos))
        .route("/files/:id", get(file))
        .route("/stream_video/:id", get(stream_video))
        .route("/signProcessDB/", post(process))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

/// Client that bypasses any proxy configured in the environment.
pub fn test_client(base: &str) -> ApiClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    ApiClient::with_http_client(base, http).unwrap()
}
