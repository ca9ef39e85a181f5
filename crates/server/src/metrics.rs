//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Descriptions for the job engine metrics recorded in `pdf_capture_core::metrics`
//! - Download counters
//! - Rendering for the `/metrics` endpoint

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use pdf_capture_core::metrics::{
    JOBS_ACTIVE, JOBS_FINISHED_TOTAL, JOBS_STARTED_TOTAL, JOB_DURATION_SECONDS, PROGRESS_STREAMS_OPEN,
};
use std::sync::OnceLock;

pub const ARTIFACT_DOWNLOADS_TOTAL: &str = "artifact_downloads_total";

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup, before any metrics are recorded.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!(JOBS_STARTED_TOTAL, "Capture jobs started");
    describe_counter!(JOBS_FINISHED_TOTAL, "Capture jobs finished, by outcome");
    describe_gauge!(JOBS_ACTIVE, "Capture jobs currently running");
    describe_histogram!(JOB_DURATION_SECONDS, "Capture job duration in seconds");
    describe_gauge!(PROGRESS_STREAMS_OPEN, "Open progress streams");
    describe_counter!(ARTIFACT_DOWNLOADS_TOTAL, "PDF download requests, by status");
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record a download request (`status` is "served" or "not_found").
pub fn record_download(status: &'static str) {
    counter!(ARTIFACT_DOWNLOADS_TOTAL, "status" => status).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_download_labels_status() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            record_download("served");
            record_download("served");
            record_download("not_found");
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"artifact_downloads_total{status="served"} 2"#));
        assert!(rendered.contains(r#"artifact_downloads_total{status="not_found"} 1"#));
    }

    #[test]
    fn test_render_available_after_init_and_init_is_once() {
        // Other tests may already have installed the recorder.
        init_metrics();
        assert!(render_metrics().is_some());
        assert!(!init_metrics());
    }
}
