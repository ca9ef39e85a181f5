// crates/core/src/capture/testing.rs
//! Scripted capture engines for tests.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

use super::{CaptureEngine, CaptureError};
use crate::progress::{ProgressSink, ProgressUpdate};

/// How a scripted capture ends.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Succeed(PathBuf),
    Fail(String),
    Panic(String),
}

/// Engine that replays a fixed list of updates, then ends with `outcome`.
#[derive(Debug, Clone)]
pub struct ScriptedCapture {
    pub updates: Vec<ProgressUpdate>,
    pub outcome: ScriptedOutcome,
    pub delay: Duration,
}

impl ScriptedCapture {
    pub fn new(updates: Vec<ProgressUpdate>, outcome: ScriptedOutcome) -> Self {
        Self {
            updates,
            outcome,
            delay: Duration::ZERO,
        }
    }

    /// Sleep this long before every update and before returning.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl CaptureEngine for ScriptedCapture {
    fn execute(&self, _url: &str, sink: &ProgressSink) -> Result<PathBuf, CaptureError> {
        for update in &self.updates {
            std::thread::sleep(self.delay);
            sink.emit(update.clone());
        }
        std::thread::sleep(self.delay);
        match &self.outcome {
            ScriptedOutcome::Succeed(path) => Ok(path.clone()),
            ScriptedOutcome::Fail(message) => Err(CaptureError::reported(message.clone())),
            ScriptedOutcome::Panic(message) => panic!("{}", message),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// One instruction fed to a [`GatedCapture`].
#[derive(Debug)]
pub enum GateStep {
    Progress(ProgressUpdate),
    Finish(ScriptedOutcome),
}

/// Engine driven step by step from the test through a [`GateController`].
///
/// Each `execute` blocks until the controller sends the next step. Meant
/// for a single job per engine.
pub struct GatedCapture {
    steps: Mutex<mpsc::Receiver<GateStep>>,
}

/// Test-side handle of a [`GatedCapture`].
#[derive(Clone)]
pub struct GateController {
    tx: mpsc::Sender<GateStep>,
}

impl GatedCapture {
    pub fn new() -> (Self, GateController) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                steps: Mutex::new(rx),
            },
            GateController { tx },
        )
    }
}

impl GateController {
    pub fn progress(&self, update: impl Into<ProgressUpdate>) {
        let _ = self.tx.send(GateStep::Progress(update.into()));
    }

    pub fn succeed(&self, path: impl Into<PathBuf>) {
        let _ = self.tx.send(GateStep::Finish(ScriptedOutcome::Succeed(path.into())));
    }

    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.tx.send(GateStep::Finish(ScriptedOutcome::Fail(message.into())));
    }

    pub fn panic(&self, message: impl Into<String>) {
        let _ = self.tx.send(GateStep::Finish(ScriptedOutcome::Panic(message.into())));
    }
}

impl CaptureEngine for GatedCapture {
    fn execute(&self, _url: &str, sink: &ProgressSink) -> Result<PathBuf, CaptureError> {
        let steps = self
            .steps
            .lock()
            .map_err(|_| CaptureError::reported("gate lock poisoned"))?;
        loop {
            match steps.recv() {
                Ok(GateStep::Progress(update)) => sink.emit(update),
                Ok(GateStep::Finish(ScriptedOutcome::Succeed(path))) => return Ok(path),
                Ok(GateStep::Finish(ScriptedOutcome::Fail(message))) => {
                    return Err(CaptureError::reported(message))
                }
                Ok(GateStep::Finish(ScriptedOutcome::Panic(message))) => panic!("{}", message),
                Err(_) => return Err(CaptureError::reported("gate closed")),
            }
        }
    }

    fn name(&self) -> &str {
        "gated"
    }
}
