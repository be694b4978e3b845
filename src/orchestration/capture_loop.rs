//! Periodic capture → inference → report loop.

use super::{LoopState, LoopStateMonitor};
use crate::capture::{Camera, CaptureError, DetectionConfig, Frame, FrameError};
use crate::completion::{completion, Pending};
use crate::detection::{FaceDetector, InferenceError};
use crate::device::CaptureHandle;
use crate::lifecycle::Lifecycle;
use crate::report::{FailureKind, Reporter, TickHealth, TickHealthMetrics, TickReport};
use std::time::Duration;
use thiserror::Error;

/// Why a tick was abandoned. Never escapes the loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Decode(#[from] FrameError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl TickError {
    /// Classification carried by the failure report.
    pub fn kind(&self) -> FailureKind {
        match self {
            TickError::Capture(_) => FailureKind::CaptureFailed,
            TickError::Decode(_) => FailureKind::FrameDecodeFailed,
            TickError::Inference(_) => FailureKind::InferenceFailed,
        }
    }
}

/// Runs ticks at a fixed period until the lifecycle is torn down.
///
/// Each tick waits `period`, captures a frame, counts faces and reports.
/// The wait starts after the previous tick finished, so a slow tick pushes
/// every later tick back instead of piling up.
pub struct CaptureDetectLoop<C, F, R> {
    camera: C,
    detector: F,
    reporter: R,
    period: Duration,
    health: TickHealth,
    state: LoopStateMonitor,
    ticks: u64,
}

impl<C, F, R> CaptureDetectLoop<C, F, R>
where
    C: Camera,
    F: FaceDetector,
    R: Reporter,
{
    /// Creates a loop with the period and alert threshold from `config`.
    pub fn new(camera: C, detector: F, reporter: R, config: &DetectionConfig) -> Self {
        Self {
            camera,
            detector,
            reporter,
            period: config.period(),
            health: TickHealth::new(config.failure_alert_threshold),
            state: LoopStateMonitor::new(),
            ticks: 0,
        }
    }

    /// State monitor shared with observers.
    pub fn state(&self) -> &LoopStateMonitor {
        &self.state
    }

    /// Camera collaborator.
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Inference collaborator.
    pub fn detector(&self) -> &F {
        &self.detector
    }

    /// Report sink.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Tick counters so far.
    pub fn health(&self) -> &TickHealthMetrics {
        self.health.metrics()
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs until `lifecycle` is torn down, then publishes `Stopped`.
    ///
    /// Teardown is observed during the wait and while a capture or an
    /// inference is outstanding; no tick starts after it is seen. A loop
    /// runs once: calling `run` again after it stopped returns immediately.
    pub async fn run(&mut self, handle: &CaptureHandle, lifecycle: &Lifecycle) {
        if self.state.get() == LoopState::Stopped {
            tracing::warn!("Capture loop already stopped, not restarting");
            return;
        }
        self.state.advance(LoopState::Running);
        tracing::info!(
            handle = handle.id(),
            period_ms = self.period.as_millis() as u64,
            "Capture loop running"
        );

        loop {
            tokio::select! {
                biased;
                _ = lifecycle.torn_down() => break,
                _ = tokio::time::sleep(self.period) => {}
            }

            let tick = self.ticks + 1;
            let result = tokio::select! {
                biased;
                _ = lifecycle.torn_down() => {
                    tracing::debug!(tick, "Teardown during tick, abandoning in-flight work");
                    break;
                }
                result = self.tick_once(handle) => result,
            };

            self.ticks = tick;
            self.report(tick, result);
        }

        self.state.advance(LoopState::Stopped);
        tracing::info!(ticks = self.ticks, "Capture loop stopped");
    }

    async fn tick_once(&self, handle: &CaptureHandle) -> Result<usize, TickError> {
        if !handle.is_valid() {
            return Err(CaptureError::HandleInvalidated.into());
        }

        let (reply, pending) = completion();
        self.camera.capture(handle, reply);
        let frame = pending.wait().await.map_err(|_| CaptureError::Abandoned)??;

        let pending = self.analyze(frame)?;
        let count = pending.wait().await.map_err(|_| InferenceError::Abandoned)??;
        Ok(count)
    }

    /// Starts inference and releases the frame, whatever the outcome.
    fn analyze(&self, frame: Frame) -> Result<Pending<Result<usize, InferenceError>>, TickError> {
        let started = frame.decode().map_err(TickError::from).and_then(|rotation| {
            tracing::trace!(
                sequence = frame.sequence(),
                rotation = rotation.degrees(),
                age_ms = frame.timestamp().elapsed().as_millis() as u64,
                "Frame decoded"
            );
            let (reply, pending) = completion();
            self.detector.infer(&frame, reply)?;
            Ok(pending)
        });

        frame.release();
        started
    }

    fn report(&mut self, tick: u64, result: Result<usize, TickError>) {
        let report = match result {
            Ok(count) => {
                self.health.record_success();
                TickReport::faces(tick, count)
            }
            Err(e) => {
                let kind = e.kind();
                tracing::debug!(tick, error = %e, kind = %kind, "Tick abandoned");
                let metrics = self.health.record_failure(kind);
                TickReport::failed(tick, kind, metrics.consecutive_failures)
            }
        };
        self.reporter.report(&report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, CaptureStep, MockCamera};
    use crate::detection::{DetectStep, ScriptedDetector};
    use crate::device::LensFacing;
    use crate::report::TickOutcome;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<TickReport>>);

    impl Reporter for Recorder {
        fn report(&self, report: &TickReport) {
            self.0.lock().unwrap().push(report.clone());
        }
    }

    impl Recorder {
        fn outcomes(&self) -> Vec<TickOutcome> {
            self.0.lock().unwrap().iter().map(|r| r.outcome.clone()).collect()
        }

        fn ticks(&self) -> Vec<u64> {
            self.0.lock().unwrap().iter().map(|r| r.tick).collect()
        }
    }

    fn test_loop(
        camera: MockCamera,
        detector: ScriptedDetector,
    ) -> CaptureDetectLoop<MockCamera, ScriptedDetector, Recorder> {
        let config = DetectionConfig {
            period_ms: 1000,
            failure_alert_threshold: 2,
        };
        CaptureDetectLoop::new(camera, detector, Recorder::default(), &config)
    }

    fn camera() -> MockCamera {
        MockCamera::new(&CaptureConfig::with_dimensions(8, 8))
    }

    async fn run_for(
        capture_loop: &mut CaptureDetectLoop<MockCamera, ScriptedDetector, Recorder>,
        millis: u64,
    ) {
        let lifecycle = Lifecycle::new();
        let handle = CaptureHandle::new(1, LensFacing::Front, &lifecycle);
        let stopper = lifecycle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            stopper.teardown();
        });
        capture_loop.run(&handle, &lifecycle).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_contained() {
        let camera = camera().script([
            CaptureStep::Fail("shutter".into()),
            CaptureStep::Corrupt,
            CaptureStep::Frame,
            CaptureStep::Frame,
        ]);
        let detector = ScriptedDetector::new().script([
            DetectStep::Fail("model".into()),
            DetectStep::Faces(2),
        ]);
        let mut capture_loop = test_loop(camera, detector);

        run_for(&mut capture_loop, 4500).await;

        assert_eq!(
            capture_loop.reporter().outcomes(),
            vec![
                TickOutcome::Failed {
                    kind: FailureKind::CaptureFailed,
                    consecutive_failures: 1
                },
                TickOutcome::Failed {
                    kind: FailureKind::FrameDecodeFailed,
                    consecutive_failures: 2
                },
                TickOutcome::Failed {
                    kind: FailureKind::InferenceFailed,
                    consecutive_failures: 3
                },
                TickOutcome::Faces { count: 2 },
            ]
        );
        assert_eq!(capture_loop.health().total_failures, 3);
        assert_eq!(capture_loop.state().get(), LoopState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_released_when_inference_refuses() {
        let detector = ScriptedDetector::new().script([
            DetectStep::Reject("malformed".into()),
            DetectStep::Faces(1),
        ]);
        let mut capture_loop = test_loop(camera(), detector);

        run_for(&mut capture_loop, 2500).await;

        let camera = capture_loop.camera();
        assert_eq!(camera.frames_produced(), 2);
        assert_eq!(camera.frames_released(), 2);
        assert_eq!(
            capture_loop.reporter().outcomes()[0],
            TickOutcome::Failed {
                kind: FailureKind::InferenceFailed,
                consecutive_failures: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_frame_skips_inference() {
        let camera = camera().script([CaptureStep::Corrupt]);
        let mut capture_loop = test_loop(camera, ScriptedDetector::new());

        run_for(&mut capture_loop, 1500).await;

        assert_eq!(capture_loop.detector().call_count(), 0);
        assert_eq!(capture_loop.camera().frames_released(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_handle_never_captures() {
        let mut capture_loop = test_loop(camera(), ScriptedDetector::new());
        let bound = Lifecycle::new();
        let handle = CaptureHandle::new(1, LensFacing::Front, &bound);
        bound.teardown();

        let lifecycle = Lifecycle::new();
        let stopper = lifecycle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            stopper.teardown();
        });
        capture_loop.run(&handle, &lifecycle).await;

        assert_eq!(capture_loop.camera().capture_count(), 0);
        assert_eq!(capture_loop.ticks(), 2);
        assert_eq!(
            capture_loop.reporter().outcomes()[1],
            TickOutcome::Failed {
                kind: FailureKind::CaptureFailed,
                consecutive_failures: 2
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_keeps_its_number() {
        let camera = camera().script([CaptureStep::Fail("shutter".into())]);
        let mut capture_loop = test_loop(camera, ScriptedDetector::with_counts([1, 1]));

        run_for(&mut capture_loop, 3500).await;

        assert_eq!(capture_loop.reporter().ticks(), vec![1, 2, 3]);
        assert_eq!(capture_loop.reporter().outcomes()[1], TickOutcome::Faces { count: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_loop_does_not_restart() {
        let mut capture_loop = test_loop(camera(), ScriptedDetector::new());
        run_for(&mut capture_loop, 1500).await;
        assert_eq!(capture_loop.ticks(), 1);

        let lifecycle = Lifecycle::new();
        let handle = CaptureHandle::new(2, LensFacing::Front, &lifecycle);
        let rerun = tokio::time::timeout(
            Duration::from_secs(10),
            capture_loop.run(&handle, &lifecycle),
        )
        .await;

        assert!(rerun.is_ok());
        assert_eq!(capture_loop.ticks(), 1);
        assert_eq!(capture_loop.camera().capture_count(), 1);
        assert_eq!(capture_loop.state().get(), LoopState::Stopped);
    }

    #[test]
    fn test_tick_error_kinds() {
        assert_eq!(
            TickError::from(CaptureError::Abandoned).kind(),
            FailureKind::CaptureFailed
        );
        assert_eq!(
            TickError::from(FrameError::EmptyPayload).kind(),
            FailureKind::FrameDecodeFailed
        );
        assert_eq!(
            TickError::from(InferenceError::Abandoned).kind(),
            FailureKind::InferenceFailed
        );
    }
}
