// crates/core/src/lib.rs
//! Session-scoped background job engine for URL-to-PDF captures.
//!
//! - `SessionStore` - latest-wins snapshot per session
//! - `JobRunner` - one OS thread per capture, always ends in a terminal snapshot
//! - `progress_stream` - per-subscriber polling stream of distinct snapshots
//! - `ArtifactResolver` - session id to downloadable file
//! - `SessionCoordinator` - session creation, subscriber tracking, retention

pub mod artifact;
pub mod capture;
pub mod coordinator;
pub mod metrics;
pub mod progress;
pub mod runner;
pub mod store;
pub mod stream;
pub mod types;

pub use artifact::{Artifact, ArtifactError, ArtifactResolver, MissingReason, PDF_CONTENT_TYPE};
pub use capture::{CaptureEngine, CaptureError, ChromeCapture};
pub use coordinator::{
    ActiveJobView, SessionCoordinator, SessionHandle, StartJobError, SubscriberRegistry,
    SubscriptionGuard,
};
pub use progress::{ProgressSink, ProgressUpdate};
pub use runner::{ActiveJob, JobRunner};
pub use store::{SessionStore, StoreError};
pub use stream::{progress_stream, DEFAULT_POLL_INTERVAL};
pub use types::*;
