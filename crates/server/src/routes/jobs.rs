// crates/server/src/routes/jobs.rs
//! API routes for background capture jobs.
//!
//! - GET /jobs - List capture jobs that have not finished yet

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use pdf_capture_core::ActiveJobView;

use crate::state::AppState;

/// GET /api/jobs - In-flight jobs, oldest first, with open stream counts.
async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<ActiveJobView>> {
    Json(state.coordinator.active_jobs())
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/jobs", get(list_jobs))
}
