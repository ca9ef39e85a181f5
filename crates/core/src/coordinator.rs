// crates/core/src/coordinator.rs
//! Session lifecycle: creation, hand-off to the runner, subscriber
//! tracking and retention of finished sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio_stream::Stream;

use crate::capture::CaptureEngine;
use crate::metrics::{record_stream_closed, record_stream_opened};
use crate::runner::{ActiveJob, JobRunner};
use crate::store::{SessionStore, StoreError};
use crate::stream::{progress_stream, DEFAULT_POLL_INTERVAL};
use crate::types::{download_url, new_session_id, ProgressSnapshot, SessionId, StreamEvent};

/// Attempts at drawing an unused session id before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

type IdGenerator = Arc<dyn Fn() -> SessionId + Send + Sync>;

/// Errors returned by [`SessionCoordinator::start_job`].
#[derive(Debug, Error)]
pub enum StartJobError {
    #[error("url must not be empty")]
    EmptyUrl,

    #[error("failed to initialize session: {0}")]
    Initialization(String),
}

/// What the caller of `start_job` gets back immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionHandle {
    pub session_id: SessionId,
    pub download_url: String,
}

/// Open progress streams per session.
///
/// An entry exists only while at least one stream for that session is open;
/// the last [`SubscriptionGuard`] to drop removes it.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    open: Arc<Mutex<HashMap<SessionId, usize>>>,
}

impl SubscriberRegistry {
    /// Register a new subscription for `session_id`.
    pub fn open(&self, session_id: impl Into<SessionId>) -> SubscriptionGuard {
        let session_id = session_id.into();
        match self.open.lock() {
            Ok(mut open) => *open.entry(session_id.clone()).or_insert(0) += 1,
            Err(e) => tracing::error!("Mutex poisoned writing subscribers: {e}"),
        }
        record_stream_opened();
        SubscriptionGuard {
            session_id,
            open: Arc::clone(&self.open),
        }
    }

    /// Number of open streams for `session_id`.
    pub fn count(&self, session_id: &str) -> usize {
        match self.open.lock() {
            Ok(open) => open.get(session_id).copied().unwrap_or(0),
            Err(e) => {
                tracing::error!("Mutex poisoned reading subscribers: {e}");
                0
            }
        }
    }

    /// Number of sessions with at least one open stream.
    pub fn sessions_watched(&self) -> usize {
        self.open.lock().map(|o| o.len()).unwrap_or(0)
    }
}

/// Held by a progress stream; releases its subscriber slot on drop.
pub struct SubscriptionGuard {
    session_id: SessionId,
    open: Arc<Mutex<HashMap<SessionId, usize>>>,
}

impl SubscriptionGuard {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        match self.open.lock() {
            Ok(mut open) => {
                if let Some(count) = open.get_mut(&self.session_id) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        open.remove(&self.session_id);
                    }
                }
            }
            Err(e) => tracing::error!("Mutex poisoned releasing subscriber: {e}"),
        }
        record_stream_closed();
        tracing::debug!(session_id = %self.session_id, "Progress subscription released");
    }
}

/// In-flight job plus the number of streams watching it.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveJobView {
    #[serde(flatten)]
    pub job: ActiveJob,
    pub subscribers: usize,
}

/// Entry point of the job engine.
///
/// Owns the session store handle, the job runner and subscriber tracking.
/// Cheap to share behind an `Arc`.
pub struct SessionCoordinator {
    store: Arc<SessionStore>,
    runner: JobRunner,
    subscribers: SubscriberRegistry,
    poll_interval: Duration,
    id_generator: IdGenerator,
}

impl SessionCoordinator {
    pub fn new(store: Arc<SessionStore>, engine: Arc<dyn CaptureEngine>) -> Self {
        Self {
            runner: JobRunner::new(Arc::clone(&store), engine),
            store,
            subscribers: SubscriberRegistry::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            id_generator: Arc::new(new_session_id),
        }
    }

    /// Replace the source of candidate session ids.
    pub fn with_id_generator(mut self, generator: impl Fn() -> SessionId + Send + Sync + 'static) -> Self {
        self.id_generator = Arc::new(generator);
        self
    }

    /// Set how often progress streams poll the store.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Create a session for `url` and start capturing it in the background.
    ///
    /// Returns as soon as the job thread is spawned. Every call creates a
    /// new, independent session, even for a URL that is already running.
    pub fn start_job(&self, url: &str) -> Result<SessionHandle, StartJobError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StartJobError::EmptyUrl);
        }

        let session_id = self.create_session()?;

        if let Err(e) = self.runner.spawn(session_id.clone(), url.to_string()) {
            // Nobody will ever finish this session; make it terminal so
            // streams on it close instead of waiting forever.
            let message = format!("failed to start capture job: {e}");
            if let Err(store_err) = self
                .store
                .update(ProgressSnapshot::failed(session_id.clone(), message.clone()))
            {
                tracing::error!(session_id = %session_id, error = %store_err, "Failed to mark session as failed");
            }
            return Err(StartJobError::Initialization(message));
        }

        tracing::info!(session_id = %session_id, url = %url, "Session started");
        Ok(SessionHandle {
            download_url: download_url(&session_id),
            session_id,
        })
    }

    /// Draw an unused id and write the initial snapshot for it.
    fn create_session(&self) -> Result<SessionId, StartJobError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = (self.id_generator)();
            match self.store.insert_new(ProgressSnapshot::starting(id.clone())) {
                Ok(()) => return Ok(id),
                Err(StoreError::AlreadyExists(_)) => {
                    tracing::debug!(session_id = %id, "Session id collision, retrying");
                }
                Err(e) => return Err(StartJobError::Initialization(e.to_string())),
            }
        }
        Err(StartJobError::Initialization(format!(
            "no unused session id after {MAX_ID_ATTEMPTS} attempts"
        )))
    }

    /// Current snapshot of a session.
    pub fn snapshot(&self, session_id: &str) -> Option<ProgressSnapshot> {
        self.store.get(session_id)
    }

    /// Open a progress stream for `session_id`.
    pub fn subscribe(&self, session_id: &str) -> impl Stream<Item = StreamEvent> + Send + 'static {
        let guard = self.subscribers.open(session_id);
        progress_stream(Arc::clone(&self.store), guard, self.poll_interval)
    }

    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.subscribers.count(session_id)
    }

    /// Running jobs with their subscriber counts, oldest first.
    pub fn active_jobs(&self) -> Vec<ActiveJobView> {
        self.runner
            .active_jobs()
            .into_iter()
            .map(|job| ActiveJobView {
                subscribers: self.subscribers.count(&job.session_id),
                job,
            })
            .collect()
    }

    pub fn active_job_count(&self) -> usize {
        self.runner.active_count()
    }

    /// Forget finished sessions whose terminal snapshot is older than
    /// `max_age`. Running sessions are never removed.
    pub fn sweep_expired(&self, max_age: Duration) -> usize {
        let removed = self.store.remove_terminal_older_than(max_age);
        if removed > 0 {
            tracing::info!(removed, "Expired finished sessions");
        }
        removed
    }
}
