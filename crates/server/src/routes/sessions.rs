// crates/server/src/routes/sessions.rs
//! Session snapshot endpoint.
//!
//! - GET /sessions/{session_id} - Latest snapshot, for clients that poll
//!   instead of streaming

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use pdf_capture_core::ProgressSnapshot;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/sessions/{session_id} - Current snapshot of one session.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<ProgressSnapshot>> {
    state
        .coordinator
        .snapshot(&session_id)
        .map(Json)
        .ok_or(ApiError::SessionNotFound(session_id))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/{session_id}", get(get_session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pdf_capture_core::capture::testing::GatedCapture;
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_get_session_snapshot() {
        let (engine, gate) = GatedCapture::new();
        let state = AppState::new(Arc::new(engine), Duration::from_millis(10));
        let handle = state.coordinator.start_job("https://example.com").unwrap();
        let app = router().with_state(Arc::clone(&state));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/sessions/{}", handle.session_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["session_id"], handle.session_id.as_str());
        assert_eq!(json["completed"], false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/sessions/missing1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        gate.fail("stop");
    }
}
