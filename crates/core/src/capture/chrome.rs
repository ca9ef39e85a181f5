// crates/core/src/capture/chrome.rs
//! Headless Chrome engine: spawns the browser with `--print-to-pdf`.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use url::Url;

use super::{CaptureEngine, CaptureError};
use crate::progress::{ProgressSink, ProgressUpdate};

/// Stderr lines kept for the error message of a failed run.
const STDERR_TAIL_LINES: usize = 20;

/// Capture engine that prints a page to PDF with a headless Chromium-family
/// browser.
///
/// Writes `<output_dir>/<session_id>.pdf`. Browser stderr is forwarded to
/// the progress sink line by line.
pub struct ChromeCapture {
    program: PathBuf,
    output_dir: PathBuf,
    virtual_time_budget_ms: u64,
    extra_args: Vec<String>,
}

impl ChromeCapture {
    /// Create an engine running `program` and writing into `output_dir`.
    pub fn new(program: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            output_dir: output_dir.into(),
            virtual_time_budget_ms: 10_000,
            extra_args: Vec::new(),
        }
    }

    /// Virtual time the page gets to settle (lazy loading, scripts) before printing.
    pub fn with_virtual_time_budget(mut self, ms: u64) -> Self {
        self.virtual_time_budget_ms = ms;
        self
    }

    /// Additional browser flags, appended before the URL.
    pub fn with_extra_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn output_path(&self, session_id: &str) -> PathBuf {
        self.output_dir.join(format!("{session_id}.pdf"))
    }

    fn command(&self, url: &Url, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "--headless",
            "--disable-gpu",
            "--no-sandbox",
            "--hide-scrollbars",
            "--no-pdf-header-footer",
            "--run-all-compositor-stages-before-draw",
        ])
        .arg(format!("--virtual-time-budget={}", self.virtual_time_budget_ms))
        .arg(format!("--print-to-pdf={}", output.display()))
        .args(&self.extra_args)
        .arg(url.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
        cmd
    }
}

impl CaptureEngine for ChromeCapture {
    fn execute(&self, url: &str, sink: &ProgressSink) -> Result<PathBuf, CaptureError> {
        let url = validate_url(url)?;

        std::fs::create_dir_all(&self.output_dir).map_err(|source| CaptureError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;
        let output = self.output_path(sink.session_id());

        sink.emit(ProgressUpdate::step("launching", 10.0, "starting headless browser"));
        tracing::info!(
            program = %self.program.display(),
            url = %url,
            output = %output.display(),
            "chrome capture: spawning"
        );

        let program = self.program.display().to_string();
        let mut child = self
            .command(&url, &output)
            .spawn()
            .map_err(|source| CaptureError::Launch {
                program: program.clone(),
                source,
            })?;

        sink.emit(ProgressUpdate::step("capturing", 50.0, format!("rendering {url}")));

        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(stderr) = child.stderr.take() {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                sink.emit(ProgressUpdate::line(line));
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            }
        }

        let status = child
            .wait()
            .map_err(|source| CaptureError::Launch { program, source })?;
        if !status.success() {
            return Err(CaptureError::BrowserExit {
                status: status.to_string(),
                stderr: Vec::from(tail).join("\n"),
            });
        }

        sink.emit(ProgressUpdate::step("saving", 90.0, "writing pdf"));
        if !output.is_file() {
            return Err(CaptureError::MissingOutput { path: output });
        }
        Ok(output)
    }

    fn name(&self) -> &str {
        "chrome"
    }
}

/// Parse `raw` and require an http(s) URL with a host.
pub fn validate_url(raw: &str) -> Result<Url, CaptureError> {
    let raw = raw.trim();
    let invalid = |reason: String| CaptureError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}
