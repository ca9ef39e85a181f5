// crates/core/src/capture/mod.rs
//! Capture engines: the black box that turns a URL into a document.
//!
//! Provides the `CaptureEngine` trait and implementations:
//! - `ChromeCapture` - prints the page to PDF with headless Chrome/Chromium
//! - `testing` - scripted engines for tests (feature `test-support`)

pub mod chrome;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

use std::path::PathBuf;

pub use chrome::{validate_url, ChromeCapture};
pub use error::CaptureError;

use crate::progress::ProgressSink;

/// A blocking capture routine.
///
/// Called on the job's own thread. Implementations may call `sink` any
/// number of times before returning and may block for as long as the
/// capture takes; there is no timeout imposed by the caller.
pub trait CaptureEngine: Send + Sync {
    /// Capture `url`, returning the path of the produced artifact.
    fn execute(&self, url: &str, sink: &ProgressSink) -> Result<PathBuf, CaptureError>;

    /// Engine name for logging (e.g. "chrome").
    fn name(&self) -> &str;
}
