// crates/server/src/routes/download.rs
//! Artifact download endpoint.
//!
//! - GET /download-pdf/{session_id} - Stream the captured PDF

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use pdf_capture_core::{ArtifactError, MissingReason};
use tokio_util::io::ReaderStream;

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_download;
use crate::state::AppState;

/// GET /download-pdf/{session_id} - The PDF of a successful capture.
///
/// 404 when the session is unknown, still running, failed, or its file
/// is gone.
pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Response> {
    let artifact = match state.artifacts.fetch(&session_id) {
        Ok(artifact) => artifact,
        Err(e) => {
            record_download("not_found");
            return Err(e.into());
        }
    };

    let file = match tokio::fs::File::open(&artifact.path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // Removed between the lookup and the open.
            record_download("not_found");
            return Err(ArtifactError::NotFound {
                session_id,
                reason: MissingReason::FileRemoved,
            }
            .into());
        }
        Err(e) => {
            return Err(ApiError::Internal(format!(
                "failed to open {}: {e}",
                artifact.path.display()
            )))
        }
    };

    record_download("served");
    tracing::info!(session_id = %session_id, file = %artifact.file_name, "Serving PDF");

    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name.replace('"', ""));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/download-pdf/{session_id}", get(download_pdf))
}
