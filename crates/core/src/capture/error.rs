// crates/core/src/capture/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a capture engine.
///
/// The `Display` text is what ends up in the terminal snapshot's `error`.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("browser exited with {status}: {stderr}")]
    BrowserExit { status: String, stderr: String },

    #[error("browser finished without writing {path}")]
    MissingOutput { path: PathBuf },

    /// Failure message reported by the engine itself.
    #[error("{0}")]
    Reported(String),
}

impl CaptureError {
    pub fn reported(message: impl Into<String>) -> Self {
        Self::Reported(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_display_is_bare_message() {
        assert_eq!(
            CaptureError::reported("navigation timeout").to_string(),
            "navigation timeout"
        );
    }

    #[test]
    fn test_missing_output_display() {
        let err = CaptureError::MissingOutput {
            path: PathBuf::from("/tmp/x.pdf"),
        };
        assert_eq!(err.to_string(), "browser finished without writing /tmp/x.pdf");
    }
}
