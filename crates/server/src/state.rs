// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pdf_capture_core::{ArtifactResolver, CaptureEngine, ChromeCapture, SessionCoordinator, SessionStore};

use crate::config::Config;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Session creation, job hand-off and progress subscriptions.
    pub coordinator: Arc<SessionCoordinator>,
    /// Read-only artifact lookups over the same session store.
    pub artifacts: ArtifactResolver,
}

impl AppState {
    /// Create state around an arbitrary capture engine.
    pub fn new(engine: Arc<dyn CaptureEngine>, poll_interval: Duration) -> Arc<Self> {
        let store = Arc::new(SessionStore::new());
        Arc::new(Self {
            start_time: Instant::now(),
            coordinator: Arc::new(
                SessionCoordinator::new(Arc::clone(&store), engine).with_poll_interval(poll_interval),
            ),
            artifacts: ArtifactResolver::new(store),
        })
    }

    /// Create state with the headless Chrome engine described by `config`.
    pub fn from_config(config: &Config) -> Arc<Self> {
        let engine = ChromeCapture::new(&config.chrome_bin, config.output_dir())
            .with_virtual_time_budget(config.virtual_time_budget_ms);
        Self::new(Arc::new(engine), config.poll_interval())
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
