//! End-to-end flows over the full router: submit, stream, download.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pdf_capture_core::capture::testing::{GatedCapture, ScriptedCapture, ScriptedOutcome};
use pdf_capture_core::CaptureEngine;
use pdf_capture_server::{create_app, AppState};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

fn app_with(engine: impl CaptureEngine + 'static) -> (Router, Arc<AppState>) {
    let state = AppState::new(Arc::new(engine), Duration::from_millis(10));
    (create_app(Arc::clone(&state)), state)
}

async fn start(app: &Router, url: &str) -> Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/process-url")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::json!({ "url": url }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Reads `data:` payloads from an SSE response body one event at a time.
struct SseReader {
    body: Body,
    buf: String,
}

impl SseReader {
    async fn open(app: &Router, session_id: &str) -> Self {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/stream-progress/{session_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        Self {
            body: response.into_body(),
            buf: String::new(),
        }
    }

    /// Next data payload, or `None` once the server closed the stream.
    async fn next(&mut self) -> Option<Value> {
        tokio::time::timeout(STEP_TIMEOUT, self.next_inner())
            .await
            .expect("timed out waiting for SSE event")
    }

    async fn next_inner(&mut self) -> Option<Value> {
        loop {
            if let Some(end) = self.buf.find("\n\n") {
                let raw: String = self.buf.drain(..end + 2).collect();
                let data: String = raw
                    .lines()
                    .filter_map(|l| l.strip_prefix("data:"))
                    .map(str::trim_start)
                    .collect();
                if data.is_empty() {
                    continue;
                }
                return Some(serde_json::from_str(&data).unwrap());
            }
            match self.body.frame().await {
                Some(frame) => {
                    if let Ok(data) = frame.unwrap().into_data() {
                        self.buf.push_str(std::str::from_utf8(&data).unwrap());
                    }
                }
                None => return None,
            }
        }
    }
}

#[tokio::test]
async fn two_subscribers_see_the_same_sequence_and_download_works() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("page.pdf");
    std::fs::write(&pdf, b"%PDF-1.4 flow").unwrap();

    let (engine, gate) = GatedCapture::new();
    let (app, state) = app_with(engine);

    let started = start(&app, "https://example.com/article").await;
    let session_id = started["session_id"].as_str().unwrap().to_string();
    assert_eq!(started["success"], true);

    let mut first = SseReader::open(&app, &session_id).await;
    let mut second = SseReader::open(&app, &session_id).await;

    for reader in [&mut first, &mut second] {
        let ack = reader.next().await.unwrap();
        assert_eq!(ack["status"], "connected");
        assert_eq!(ack["session_id"], session_id.as_str());
        let initial = reader.next().await.unwrap();
        assert_eq!(initial["log"], "starting");
        assert_eq!(initial["completed"], false);
    }
    assert_eq!(state.coordinator.subscriber_count(&session_id), 2);

    // Downloads are refused until the job has succeeded.
    let early = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/download-pdf/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(early.status(), StatusCode::NOT_FOUND);

    gate.progress(("loading", 10.0, "opening page"));
    for reader in [&mut first, &mut second] {
        let event = reader.next().await.unwrap();
        assert_eq!(event["log"], "[loading] opening page (10%)");
        assert_eq!(event["completed"], false);
    }

    gate.succeed(&pdf);
    for reader in [&mut first, &mut second] {
        let event = reader.next().await.unwrap();
        assert_eq!(event["completed"], true);
        assert_eq!(event["error"], Value::Null);
        assert_eq!(event["artifact_path"], pdf.to_str().unwrap());
        assert!(reader.next().await.is_none(), "stream must close after terminal");
    }
    assert_eq!(state.coordinator.subscriber_count(&session_id), 0);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/download-pdf/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"%PDF-1.4 flow");
}

#[tokio::test]
async fn panicking_capture_ends_stream_with_failure() {
    let engine = ScriptedCapture::new(
        vec!["resolving".into()],
        ScriptedOutcome::Panic("renderer crashed".into()),
    )
    .with_delay(Duration::from_millis(20));
    let (app, state) = app_with(engine);

    let started = start(&app, "https://example.com").await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let mut reader = SseReader::open(&app, &session_id).await;
    let mut last = None;
    while let Some(event) = reader.next().await {
        last = Some(event);
    }
    let last = last.unwrap();
    assert_eq!(last["completed"], true);
    assert!(last["error"].as_str().unwrap().contains("renderer crashed"));

    // The job deregisters right after writing its terminal snapshot.
    for _ in 0..200 {
        if state.coordinator.active_job_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let jobs = app
        .oneshot(Request::builder().uri("/api/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = jobs.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), serde_json::json!([]));
}

#[tokio::test]
async fn same_url_twice_creates_independent_sessions() {
    let engine = ScriptedCapture::new(vec![], ScriptedOutcome::Fail("offline".into()));
    let (app, _) = app_with(engine);

    let a = start(&app, "https://example.com").await;
    let b = start(&app, "https://example.com").await;
    assert_ne!(a["session_id"], b["session_id"]);
    assert_eq!(
        a["download_url"],
        format!("/download-pdf/{}", a["session_id"].as_str().unwrap())
    );
}

#[tokio::test]
async fn subscribing_after_completion_gets_terminal_then_closes() {
    let engine = ScriptedCapture::new(vec![], ScriptedOutcome::Fail("offline".into()));
    let (app, state) = app_with(engine);

    let started = start(&app, "https://example.com").await;
    let session_id = started["session_id"].as_str().unwrap().to_string();
    for _ in 0..200 {
        if state
            .coordinator
            .snapshot(&session_id)
            .is_some_and(|s| s.is_terminal())
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut reader = SseReader::open(&app, &session_id).await;
    assert_eq!(reader.next().await.unwrap()["status"], "connected");
    let terminal = reader.next().await.unwrap();
    assert_eq!(terminal["completed"], true);
    assert_eq!(terminal["error"], "offline");
    assert!(reader.next().await.is_none());
}
