//! Sequencing of permission, device acquisition and the capture loop.

use super::{CaptureDetectLoop, LoopState, LoopStateMonitor};
use crate::capture::Camera;
use crate::detection::FaceDetector;
use crate::device::{DeviceError, DeviceProvider, DeviceSession};
use crate::lifecycle::Lifecycle;
use crate::permission::{PermissionGate, PermissionPrompt};
use crate::report::Reporter;
use thiserror::Error;

/// Terminal failures handed back to the activation owner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("device acquisition failed: {0}")]
    DeviceAcquisition(#[source] DeviceError),
}

/// Runs the whole activation on one task.
pub struct Orchestrator<P, D, C, F, R> {
    gate: PermissionGate<P>,
    session: DeviceSession<D>,
    capture_loop: CaptureDetectLoop<C, F, R>,
    state: LoopStateMonitor,
}

impl<P, D, C, F, R> Orchestrator<P, D, C, F, R>
where
    P: PermissionPrompt,
    D: DeviceProvider,
    C: Camera,
    F: FaceDetector,
    R: Reporter,
{
    /// Wires the stages together. The loop's state monitor becomes the
    /// orchestrator's.
    pub fn new(
        gate: PermissionGate<P>,
        session: DeviceSession<D>,
        capture_loop: CaptureDetectLoop<C, F, R>,
    ) -> Self {
        let state = capture_loop.state().clone();
        Self {
            gate,
            session,
            capture_loop,
            state,
        }
    }

    /// State monitor for observers.
    pub fn state(&self) -> &LoopStateMonitor {
        &self.state
    }

    /// Permission stage.
    pub fn gate(&self) -> &PermissionGate<P> {
        &self.gate
    }

    /// Device acquisition stage.
    pub fn session(&self) -> &DeviceSession<D> {
        &self.session
    }

    /// Capture loop stage.
    pub fn capture_loop(&self) -> &CaptureDetectLoop<C, F, R> {
        &self.capture_loop
    }

    /// Runs until teardown or a terminal failure.
    ///
    /// Teardown at any stage is a normal exit. Every exit leaves the state
    /// at `Stopped`.
    pub async fn run(&mut self, lifecycle: &Lifecycle) -> Result<(), OrchestrationError> {
        let result = self.run_stages(lifecycle).await;
        self.state.advance(LoopState::Stopped);

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Capture activation ended");
        }
        result
    }

    async fn run_stages(&mut self, lifecycle: &Lifecycle) -> Result<(), OrchestrationError> {
        if lifecycle.is_torn_down() {
            return Ok(());
        }

        self.state.advance(LoopState::AwaitingPermission);
        let outcome = tokio::select! {
            biased;
            _ = lifecycle.torn_down() => {
                tracing::info!("Torn down while awaiting permission");
                return Ok(());
            }
            outcome = self.gate.request() => outcome,
        };
        if !outcome.is_granted() {
            return Err(OrchestrationError::PermissionDenied);
        }

        self.state.advance(LoopState::AcquiringDevice);
        let handle = match self.session.acquire(lifecycle).await {
            Ok(handle) => handle,
            Err(DeviceError::Cancelled) => {
                tracing::info!("Torn down while acquiring device");
                return Ok(());
            }
            Err(e) => return Err(OrchestrationError::DeviceAcquisition(e)),
        };

        self.capture_loop.run(&handle, lifecycle).await;
        Ok(())
    }
}
