// crates/core/src/progress.rs
//! Progress updates reported by a capture engine and the sink that turns
//! them into snapshot writes.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::store::SessionStore;
use crate::types::{ProgressSnapshot, SessionId};

/// A single progress report from a capture engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// Free-form status line, stored verbatim.
    Line(String),
    /// Structured step, rendered as `[status] message (percent%)`.
    Step {
        status: String,
        percent: f64,
        message: String,
    },
    /// Any other payload, rendered as `(a, b, ...)`.
    Other(Vec<String>),
}

impl ProgressUpdate {
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }

    pub fn step(status: impl Into<String>, percent: f64, message: impl Into<String>) -> Self {
        Self::Step {
            status: status.into(),
            percent,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressUpdate::Line(text) => f.write_str(text),
            ProgressUpdate::Step {
                status,
                percent,
                message,
            } => write!(f, "[{status}] {message} ({percent}%)"),
            ProgressUpdate::Other(parts) => write!(f, "({})", parts.join(", ")),
        }
    }
}

impl From<&str> for ProgressUpdate {
    fn from(text: &str) -> Self {
        Self::Line(text.to_string())
    }
}

impl From<String> for ProgressUpdate {
    fn from(text: String) -> Self {
        Self::Line(text)
    }
}

impl<S, M> From<(S, f64, M)> for ProgressUpdate
where
    S: Into<String>,
    M: Into<String>,
{
    fn from((status, percent, message): (S, f64, M)) -> Self {
        Self::step(status, percent, message)
    }
}

type EmitFn = dyn Fn(ProgressUpdate) + Send + Sync;

/// Write handle handed to a capture engine.
///
/// Emitting never fails from the engine's point of view: store rejections
/// and panics raised while handling an update are logged and dropped.
#[derive(Clone)]
pub struct ProgressSink {
    session_id: SessionId,
    emit: Arc<EmitFn>,
}

impl ProgressSink {
    /// Build a sink around an arbitrary callback.
    pub fn new<F>(session_id: impl Into<SessionId>, emit: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        Self {
            session_id: session_id.into(),
            emit: Arc::new(emit),
        }
    }

    /// Sink that overwrites the session's snapshot in `store` on every update.
    pub fn for_session(store: Arc<SessionStore>, session_id: impl Into<SessionId>) -> Self {
        let session_id = session_id.into();
        let id = session_id.clone();
        Self::new(session_id, move |update: ProgressUpdate| {
            let snapshot = ProgressSnapshot::running(id.clone(), update.to_string());
            if let Err(e) = store.update(snapshot) {
                tracing::debug!(session_id = %id, error = %e, "Progress update dropped");
            }
        })
    }

    /// Session this sink writes to. Engines use it to name their output.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Report progress.
    pub fn emit(&self, update: impl Into<ProgressUpdate>) {
        let update = update.into();
        let emit = &self.emit;
        if panic::catch_unwind(AssertUnwindSafe(|| emit(update))).is_err() {
            tracing::warn!(session_id = %self.session_id, "Progress callback panicked; update ignored");
        }
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
