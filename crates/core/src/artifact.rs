// crates/core/src/artifact.rs
//! Resolves the downloadable artifact of a finished session.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::store::SessionStore;
use crate::types::SessionId;

/// Content type of every artifact this service produces.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A produced file that currently exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: &'static str,
}

/// Why no artifact could be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    UnknownSession,
    NotFinished,
    JobFailed,
    FileRemoved,
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingReason::UnknownSession => "unknown session",
            MissingReason::NotFinished => "job has not finished",
            MissingReason::JobFailed => "job failed",
            MissingReason::FileRemoved => "file no longer exists",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("no artifact for session {session_id}: {reason}")]
    NotFound {
        session_id: SessionId,
        reason: MissingReason,
    },
}

impl ArtifactError {
    pub fn reason(&self) -> MissingReason {
        match self {
            ArtifactError::NotFound { reason, .. } => *reason,
        }
    }
}

/// Looks up artifacts through the session store (read-only).
#[derive(Clone)]
pub struct ArtifactResolver {
    store: Arc<SessionStore>,
}

impl ArtifactResolver {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// The artifact of `session_id`, if the job succeeded and the file is
    /// still present.
    pub fn fetch(&self, session_id: &str) -> Result<Artifact, ArtifactError> {
        let not_found = |reason| ArtifactError::NotFound {
            session_id: session_id.to_owned(),
            reason,
        };

        let snapshot = self
            .store
            .get(session_id)
            .ok_or_else(|| not_found(MissingReason::UnknownSession))?;
        let Some(raw_path) = snapshot.artifact_path() else {
            return Err(not_found(if snapshot.error().is_some() {
                MissingReason::JobFailed
            } else {
                MissingReason::NotFinished
            }));
        };

        let path = PathBuf::from(raw_path);
        if !path.is_file() {
            return Err(not_found(MissingReason::FileRemoved));
        }
        Ok(Artifact {
            file_name: file_name_of(&path),
            path,
            content_type: PDF_CONTENT_TYPE,
        })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string())
}
