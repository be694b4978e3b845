//! Camera abstraction for still capture.
//!
//! Captures complete through a callback on the camera's own execution
//! context. A trait keeps the capture loop independent of the hardware, and
//! [`MockCamera`] stands in for it in tests and the demo binary.

use super::{CaptureConfig, Frame};
use crate::completion::Completion;
use crate::device::CaptureHandle;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during capture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("capture handle is no longer bound")]
    HandleInvalidated,
    #[error("camera dropped the capture callback")]
    Abandoned,
}

/// Trait for still-capture implementations.
pub trait Camera: Send + Sync {
    /// Takes one picture with the bound device.
    ///
    /// `reply` receives the frame or an error exactly once.
    fn capture(&self, handle: &CaptureHandle, reply: Completion<Result<Frame, CaptureError>>);
}

/// What [`MockCamera`] does for one capture call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStep {
    /// Deliver a well-formed synthetic frame.
    Frame,
    /// Deliver a frame whose payload does not match its dimensions.
    Corrupt,
    /// Report a capture error.
    Fail(String),
    /// Never answer.
    Stall,
}

/// Mock camera that generates synthetic frames.
///
/// Steps queued with [`MockCamera::script`] are consumed one per capture; once
/// the script runs out every capture yields a good frame.
#[derive(Debug)]
pub struct MockCamera {
    config: CaptureConfig,
    latency: Option<Duration>,
    script: Mutex<VecDeque<CaptureStep>>,
    stalled: Mutex<Vec<Completion<Result<Frame, CaptureError>>>>,
    sequence: AtomicU64,
    captures: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl MockCamera {
    /// Camera producing synthetic frames sized by `config`.
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            config: config.clone(),
            latency: None,
            script: Mutex::new(VecDeque::new()),
            stalled: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
            captures: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delivers each result after `latency` from a separate task.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queues per-capture behaviour.
    pub fn script(self, steps: impl IntoIterator<Item = CaptureStep>) -> Self {
        self.lock_script().extend(steps);
        self
    }

    /// Number of capture calls received.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// Number of frames produced so far.
    pub fn frames_produced(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Number of produced frames whose buffer has been released.
    pub fn frames_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<CaptureStep>> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn synthesize(&self, corrupt: bool) -> Frame {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let pixel_count = (self.config.width as usize) * (self.config.height as usize);
        let len = if corrupt { pixel_count / 2 } else { pixel_count };

        // Deterministic gradient shifted by sequence; content is irrelevant.
        let pixels: Vec<u8> = (0..len)
            .map(|i| ((i as u64 ^ sequence) % 256) as u8)
            .collect();

        let released = Arc::clone(&self.released);
        Frame::new(pixels, self.config.width, self.config.height, sequence)
            .with_rotation(self.config.rotation_degrees)
            .with_release(move || {
                released.fetch_add(1, Ordering::SeqCst);
            })
    }
}

impl Camera for MockCamera {
    fn capture(&self, handle: &CaptureHandle, reply: Completion<Result<Frame, CaptureError>>) {
        self.captures.fetch_add(1, Ordering::SeqCst);
        let step = self.lock_script().pop_front().unwrap_or(CaptureStep::Frame);

        let result = match step {
            _ if !handle.is_valid() => Err(CaptureError::HandleInvalidated),
            CaptureStep::Frame => Ok(self.synthesize(false)),
            CaptureStep::Corrupt => Ok(self.synthesize(true)),
            CaptureStep::Fail(reason) => Err(CaptureError::CaptureFailed(reason)),
            CaptureStep::Stall => {
                self.stalled
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(reply);
                return;
            }
        };

        tracing::trace!(handle = handle.id(), ok = result.is_ok(), "MockCamera capture");

        match self.latency {
            Some(latency) => {
                tokio::spawn(async move {
                    tokio::time::sleep(latency).await;
                    reply.complete(result);
                });
            }
            None => reply.complete(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::completion;
    use crate::device::LensFacing;
    use crate::lifecycle::Lifecycle;

    fn small_config() -> CaptureConfig {
        CaptureConfig::with_dimensions(8, 6)
    }

    #[tokio::test]
    async fn test_mock_camera_sequence() {
        let camera = MockCamera::new(&small_config());
        let lifecycle = Lifecycle::new();
        let handle = CaptureHandle::new(1, LensFacing::Front, &lifecycle);

        for expected in 1..=2 {
            let (reply, pending) = completion();
            camera.capture(&handle, reply);
            let frame = pending.wait().await.unwrap().unwrap();
            assert!(frame.decode().is_ok());
            assert_eq!(frame.sequence(), expected);
        }

        assert_eq!(camera.capture_count(), 2);
        assert_eq!(camera.frames_released(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failure_then_frame() {
        let camera = MockCamera::new(&small_config())
            .script([CaptureStep::Fail("shutter".into()), CaptureStep::Corrupt]);
        let lifecycle = Lifecycle::new();
        let handle = CaptureHandle::new(1, LensFacing::Front, &lifecycle);

        let (reply, pending) = completion();
        camera.capture(&handle, reply);
        assert!(matches!(
            pending.wait().await.unwrap(),
            Err(CaptureError::CaptureFailed(_))
        ));

        let (reply, pending) = completion();
        camera.capture(&handle, reply);
        let frame = pending.wait().await.unwrap().unwrap();
        assert!(frame.decode().is_err());
    }

    #[tokio::test]
    async fn test_capture_after_teardown() {
        let camera = MockCamera::new(&small_config());
        let lifecycle = Lifecycle::new();
        let handle = CaptureHandle::new(1, LensFacing::Front, &lifecycle);
        lifecycle.teardown();

        let (reply, pending) = completion();
        camera.capture(&handle, reply);
        assert_eq!(
            pending.wait().await.unwrap().unwrap_err(),
            CaptureError::HandleInvalidated
        );
        assert_eq!(camera.frames_produced(), 0);
    }
}
