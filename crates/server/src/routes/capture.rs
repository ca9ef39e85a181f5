// crates/server/src/routes/capture.rs
//! Capture submission endpoints.
//!
//! - GET /            - Service banner
//! - POST /process-url - Start a capture and return its session id

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct ProcessUrlRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct ProcessUrlResponse {
    pub session_id: String,
    pub success: bool,
    pub message: String,
    pub download_url: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
}

/// GET / - Identifies the service.
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "pdf-capture service",
    })
}

/// POST /process-url - Create a session and capture `url` in the background.
///
/// Returns immediately; progress is available on `/stream-progress/{id}`.
pub async fn process_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessUrlRequest>,
) -> ApiResult<Json<ProcessUrlResponse>> {
    let handle = state.coordinator.start_job(&req.url)?;
    Ok(Json(ProcessUrlResponse {
        session_id: handle.session_id,
        success: true,
        message: "Capture started; follow progress on the stream endpoint.".to_string(),
        download_url: handle.download_url,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/process-url", post(process_url))
}
