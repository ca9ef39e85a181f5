// crates/server/src/routes/progress.rs
//! SSE progress stream for a capture session.
//!
//! - GET /stream-progress/{session_id} - connected ack, then each distinct
//!   snapshot; the stream ends after the terminal one.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header::HeaderName, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Router,
};
use pdf_capture_core::StreamEvent;
use tokio_stream::StreamExt;

use crate::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

fn to_event(event: &StreamEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize progress event");
            Event::default().data("{}")
        }
    }
}

/// GET /stream-progress/{session_id} - Server-sent progress events.
///
/// Every connection gets its own independent stream. Disconnecting drops
/// the stream and releases the subscription.
pub async fn stream_progress(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let events = state
        .coordinator
        .subscribe(&session_id)
        .map(|event| Ok::<_, Infallible>(to_event(&event)));

    let sse = Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    );
    (
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        sse,
    )
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/stream-progress/{session_id}", get(stream_progress))
}
