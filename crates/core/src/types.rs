// crates/core/src/types.rs
//! Wire types shared by the job engine and the HTTP layer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Short opaque identifier for one capture session.
pub type SessionId = String;

/// Length of a generated session id (hex characters).
pub const SESSION_ID_LEN: usize = 8;

/// Generate a candidate session id: the first 8 hex chars of a v4 UUID.
///
/// Not guaranteed unique on its own; the coordinator retries when the id
/// is already present in the store.
pub fn new_session_id() -> SessionId {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(SESSION_ID_LEN);
    id
}

/// Path a client uses to download the artifact of `session_id`.
pub fn download_url(session_id: &str) -> String {
    format!("/download-pdf/{session_id}")
}

/// Most recently known state of a capture job.
///
/// A snapshot replaces the previous one wholesale; nothing accumulates.
/// Fields are private so that a terminal snapshot can only be built through
/// [`ProgressSnapshot::succeeded`] or [`ProgressSnapshot::failed`], which keeps
/// `error` and `artifact_path` mutually exclusive. Deserialization enforces
/// the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(try_from = "RawSnapshot")]
#[cfg_attr(
    feature = "codegen",
    ts(export, export_to = "../../bindings/")
)]
pub struct ProgressSnapshot {
    session_id: SessionId,
    log: Option<String>,
    completed: bool,
    error: Option<String>,
    artifact_path: Option<String>,
}

/// Unchecked wire form of a [`ProgressSnapshot`].
#[derive(Deserialize)]
struct RawSnapshot {
    session_id: SessionId,
    #[serde(default)]
    log: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, alias = "pdf_path")]
    artifact_path: Option<String>,
}

impl TryFrom<RawSnapshot> for ProgressSnapshot {
    type Error = String;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        if raw.error.is_some() && raw.artifact_path.is_some() {
            return Err("snapshot carries both error and artifact_path".to_string());
        }
        if !raw.completed && (raw.error.is_some() || raw.artifact_path.is_some()) {
            return Err("error and artifact_path require completed=true".to_string());
        }
        Ok(Self {
            session_id: raw.session_id,
            log: raw.log,
            completed: raw.completed,
            error: raw.error,
            artifact_path: raw.artifact_path,
        })
    }
}

impl ProgressSnapshot {
    /// Initial snapshot written when a session is created.
    pub fn starting(session_id: impl Into<SessionId>) -> Self {
        Self::running(session_id, "starting")
    }

    /// Non-terminal snapshot carrying the latest status line.
    pub fn running(session_id: impl Into<SessionId>, log: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            log: Some(log.into()),
            completed: false,
            error: None,
            artifact_path: None,
        }
    }

    /// Terminal success snapshot.
    pub fn succeeded(session_id: impl Into<SessionId>, artifact_path: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            log: Some("done".to_string()),
            completed: true,
            error: None,
            artifact_path: Some(artifact_path.into()),
        }
    }

    /// Terminal failure snapshot.
    pub fn failed(session_id: impl Into<SessionId>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            session_id: session_id.into(),
            log: Some(format!("failed: {error}")),
            completed: true,
            error: Some(error),
            artifact_path: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn log(&self) -> Option<&str> {
        self.log.as_deref()
    }

    /// True once the job reached a terminal state (success or failure).
    pub fn is_terminal(&self) -> bool {
        self.completed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn artifact_path(&self) -> Option<&str> {
        self.artifact_path.as_deref()
    }
}

/// Acknowledgement sent as the first event of every progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(
    feature = "codegen",
    ts(export, export_to = "../../bindings/")
)]
pub struct ConnectedAck {
    pub session_id: SessionId,
    pub status: String,
    pub log: String,
}

impl ConnectedAck {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            status: "connected".to_string(),
            log: "stream connected".to_string(),
        }
    }
}

/// One item of a progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Connected(ConnectedAck),
    Snapshot(ProgressSnapshot),
}

impl StreamEvent {
    /// True for a snapshot with `completed=true`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Snapshot(s) if s.is_terminal())
    }
}
