// crates/core/src/metrics.rs
//! Job engine metrics.
//!
//! Recorded through the `metrics` facade; they are no-ops until the server
//! installs a recorder (see `pdf_capture_server::metrics::init_metrics`).

use std::time::Duration;

use metrics::{counter, gauge, histogram};

pub const JOBS_STARTED_TOTAL: &str = "jobs_started_total";
pub const JOBS_FINISHED_TOTAL: &str = "jobs_finished_total";
pub const JOBS_ACTIVE: &str = "jobs_active";
pub const JOB_DURATION_SECONDS: &str = "job_duration_seconds";
pub const PROGRESS_STREAMS_OPEN: &str = "progress_streams_open";

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
    Panicked,
}

impl JobOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            JobOutcome::Succeeded => "succeeded",
            JobOutcome::Failed => "failed",
            JobOutcome::Panicked => "panicked",
        }
    }
}

/// Call only once the job thread exists.
pub fn record_job_started() {
    counter!(JOBS_STARTED_TOTAL).increment(1);
    gauge!(JOBS_ACTIVE).increment(1.0);
}

pub fn record_job_finished(outcome: JobOutcome, duration: Duration) {
    counter!(JOBS_FINISHED_TOTAL, "outcome" => outcome.as_str()).increment(1);
    histogram!(JOB_DURATION_SECONDS, "outcome" => outcome.as_str()).record(duration.as_secs_f64());
    gauge!(JOBS_ACTIVE).decrement(1.0);
}

pub fn record_stream_opened() {
    gauge!(PROGRESS_STREAMS_OPEN).increment(1.0);
}

pub fn record_stream_closed() {
    gauge!(PROGRESS_STREAMS_OPEN).decrement(1.0);
}
