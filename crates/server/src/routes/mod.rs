// crates/server/src/routes/mod.rs
//! API route handlers for the Axum server.

pub mod capture;
pub mod download;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod progress;
pub mod sessions;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the full router.
///
/// Capture, progress and download routes stay at the root where existing
/// clients call them. Introspection lives under `/api`:
/// - GET  /api/health
/// - GET  /api/jobs
/// - GET  /api/sessions/{session_id}
///
/// `/metrics` is also at the root.
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(health::router())
                .merge(jobs::router())
                .merge(sessions::router()),
        )
        .merge(capture::router())
        .merge(progress::router())
        .merge(download::router())
        .merge(metrics::router())
        .with_state(state)
}
