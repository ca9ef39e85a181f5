// crates/core/src/runner.rs
//! Job runner: drives a capture engine on its own OS thread per session.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::capture::CaptureEngine;
use crate::metrics::{record_job_finished, record_job_started, JobOutcome};
use crate::progress::ProgressSink;
use crate::store::SessionStore;
use crate::types::{ProgressSnapshot, SessionId};

/// A job whose terminal snapshot has not been written yet.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveJob {
    pub session_id: SessionId,
    pub url: String,
    pub engine: String,
    pub started_at: DateTime<Utc>,
}

type JobRegistry = Arc<RwLock<HashMap<SessionId, ActiveJob>>>;

/// Spawns capture jobs and keeps a registry of the ones still running.
///
/// Each job runs detached on a named thread (`capture-<session_id>`). The
/// thread only writes to the store through a [`ProgressSink`] and finally
/// writes exactly one terminal snapshot, also when the engine panics.
#[derive(Clone)]
pub struct JobRunner {
    store: Arc<SessionStore>,
    engine: Arc<dyn CaptureEngine>,
    jobs: JobRegistry,
}

impl JobRunner {
    pub fn new(store: Arc<SessionStore>, engine: Arc<dyn CaptureEngine>) -> Self {
        Self {
            store,
            engine,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start capturing `url` for an existing session. Returns once the
    /// thread is spawned; the capture itself runs in the background.
    pub fn spawn(&self, session_id: SessionId, url: String) -> std::io::Result<()> {
        self.spawn_with(session_id, url, |name, task| {
            std::thread::Builder::new()
                .name(name)
                .spawn(move || task.run())
                .map(drop)
        })
    }

    fn spawn_with<F>(&self, session_id: SessionId, url: String, spawn_thread: F) -> std::io::Result<()>
    where
        F: FnOnce(String, JobTask) -> std::io::Result<()>,
    {
        let job = ActiveJob {
            session_id: session_id.clone(),
            url: url.clone(),
            engine: self.engine.name().to_string(),
            started_at: Utc::now(),
        };
        register(&self.jobs, job);

        let task = JobTask {
            store: Arc::clone(&self.store),
            engine: Arc::clone(&self.engine),
            jobs: Arc::clone(&self.jobs),
            session_id: session_id.clone(),
            url,
        };
        if let Err(e) = spawn_thread(format!("capture-{session_id}"), task) {
            tracing::error!(session_id = %session_id, error = %e, "Failed to spawn capture thread");
            deregister(&self.jobs, &session_id);
            return Err(e);
        }
        record_job_started();
        Ok(())
    }

    /// All jobs that have not written their terminal snapshot yet.
    pub fn active_jobs(&self) -> Vec<ActiveJob> {
        match self.jobs.read() {
            Ok(jobs) => {
                let mut active: Vec<_> = jobs.values().cloned().collect();
                active.sort_by(|a, b| a.started_at.cmp(&b.started_at));
                active
            }
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs: {e}");
                Vec::new()
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.jobs.read().map(|j| j.len()).unwrap_or(0)
    }
}

struct JobTask {
    store: Arc<SessionStore>,
    engine: Arc<dyn CaptureEngine>,
    jobs: JobRegistry,
    session_id: SessionId,
    url: String,
}

impl JobTask {
    fn run(self) {
        let started = Instant::now();
        let id = self.session_id.clone();
        tracing::info!(session_id = %id, url = %self.url, engine = self.engine.name(), "Capture job started");

        let sink = ProgressSink::for_session(Arc::clone(&self.store), id.clone());
        let engine = &self.engine;
        let url = &self.url;
        let result = panic::catch_unwind(AssertUnwindSafe(|| engine.execute(url, &sink)));

        let (outcome, terminal) = match result {
            Ok(Ok(path)) => {
                tracing::info!(session_id = %id, path = %path.display(), "Capture job succeeded");
                (
                    JobOutcome::Succeeded,
                    ProgressSnapshot::succeeded(id.clone(), path.display().to_string()),
                )
            }
            Ok(Err(e)) => {
                tracing::warn!(session_id = %id, error = %e, "Capture job failed");
                (JobOutcome::Failed, ProgressSnapshot::failed(id.clone(), e.to_string()))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(session_id = %id, panic = %message, "Capture job panicked");
                (JobOutcome::Panicked, ProgressSnapshot::failed(id.clone(), message))
            }
        };

        if let Err(e) = self.store.update(terminal) {
            tracing::error!(session_id = %id, error = %e, "Failed to write terminal snapshot");
        }
        deregister(&self.jobs, &id);
        record_job_finished(outcome, started.elapsed());
    }
}

fn register(jobs: &JobRegistry, job: ActiveJob) {
    match jobs.write() {
        Ok(mut jobs) => {
            jobs.insert(job.session_id.clone(), job);
        }
        Err(e) => tracing::error!("RwLock poisoned writing jobs map: {e}"),
    }
}

fn deregister(jobs: &JobRegistry, session_id: &str) {
    match jobs.write() {
        Ok(mut jobs) => {
            jobs.remove(session_id);
        }
        Err(e) => tracing::error!("RwLock poisoned writing jobs map: {e}"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "capture panicked".to_string()
    }
}
