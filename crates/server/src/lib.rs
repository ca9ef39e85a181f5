// crates/server/src/lib.rs
//! pdf-capture server library.
//!
//! Axum HTTP surface over the capture job engine: submit a URL, follow
//! its progress over SSE, download the resulting PDF.

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use pdf_capture_core::SessionCoordinator;
use pdf_capture_observability::{RequestSpan, UlidRequestId};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// How often the retention sweep looks for expired sessions.
pub const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - Capture, progress, download and introspection routes
/// - CORS (any origin, method and header)
/// - Request ids (ULID, echoed back in `x-request-id`) and request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
        .layer(SetRequestIdLayer::x_request_id(UlidRequestId))
}

/// Periodically drop finished sessions older than `max_age`.
pub fn spawn_retention_sweep(
    coordinator: Arc<SessionCoordinator>,
    max_age: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = coordinator.sweep_expired(max_age);
            tracing::debug!(removed, "Retention sweep finished");
        }
    })
}

// ============================================================================
// Integration Tests
// ============================================================================
