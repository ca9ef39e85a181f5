// crates/server/src/routes/health.rs
//! Liveness endpoint: process is up, plus how many captures are in flight.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Liveness report. `active_jobs` counts captures whose thread is still
/// running, so a stuck browser shows up here.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_jobs: usize,
}

/// GET /api/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        active_jobs: state.coordinator.active_job_count(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pdf_capture_core::capture::testing::GatedCapture;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn fetch_health(state: Arc<AppState>) -> HealthResponse {
        let response = router()
            .with_state(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_counts_running_captures() {
        let (engine, gate) = GatedCapture::new();
        let state = AppState::new(Arc::new(engine), Duration::from_millis(10));

        let idle = fetch_health(Arc::clone(&state)).await;
        assert_eq!(idle.status, "ok");
        assert_eq!(idle.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(idle.active_jobs, 0);

        state.coordinator.start_job("https://example.com").unwrap();
        let busy = fetch_health(Arc::clone(&state)).await;
        assert_eq!(busy.active_jobs, 1);

        gate.fail("stop");
    }
}
