//! Face detector trait and a scripted implementation.

use crate::capture::Frame;
use crate::completion::Completion;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by an inference engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("inference engine error: {0}")]
    Engine(String),
    #[error("inference request rejected: {0}")]
    Rejected(String),
    #[error("inference engine dropped the result callback")]
    Abandoned,
}

/// Face-detection inference engine.
pub trait FaceDetector: Send + Sync {
    /// Starts counting faces in `frame`.
    ///
    /// Implementations copy whatever they need from `frame` before returning;
    /// the caller releases the frame as soon as this call returns. A
    /// synchronous `Err` means the request never started and `reply` is
    /// discarded. Otherwise `reply` receives the count or an error exactly
    /// once.
    fn infer(
        &self,
        frame: &Frame,
        reply: Completion<Result<usize, InferenceError>>,
    ) -> Result<(), InferenceError>;
}

/// What [`ScriptedDetector`] does for one inference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectStep {
    /// Report this many faces.
    Faces(usize),
    /// Fail asynchronously.
    Fail(String),
    /// Refuse to start the request.
    Reject(String),
    /// Never answer.
    Stall,
}

/// Detector that replays a fixed script, then reports zero faces.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    latency: Option<Duration>,
    script: Mutex<VecDeque<DetectStep>>,
    stalled: Mutex<Vec<Completion<Result<usize, InferenceError>>>>,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    /// Detector reporting zero faces for every frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector reporting the given counts in order.
    pub fn with_counts(counts: impl IntoIterator<Item = usize>) -> Self {
        Self::new().script(counts.into_iter().map(DetectStep::Faces))
    }

    /// Queues per-call behaviour.
    pub fn script(self, steps: impl IntoIterator<Item = DetectStep>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(steps);
        self
    }

    /// Delivers each result after `latency` from a separate task.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of inference calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FaceDetector for ScriptedDetector {
    fn infer(
        &self,
        frame: &Frame,
        reply: Completion<Result<usize, InferenceError>>,
    ) -> Result<(), InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or(DetectStep::Faces(0));

        tracing::trace!(sequence = frame.sequence(), ?step, "ScriptedDetector infer");

        let result = match step {
            DetectStep::Faces(count) => Ok(count),
            DetectStep::Fail(reason) => Err(InferenceError::Engine(reason)),
            DetectStep::Reject(reason) => return Err(InferenceError::Rejected(reason)),
            DetectStep::Stall => {
                self.stalled
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(reply);
                return Ok(());
            }
        };

        match self.latency {
            Some(latency) => {
                tokio::spawn(async move {
                    tokio::time::sleep(latency).await;
                    reply.complete(result);
                });
            }
            None => reply.complete(result),
        }
        Ok(())
    }
}
