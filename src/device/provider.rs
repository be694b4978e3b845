//! Simulated device provider.

use super::{CaptureHandle, DeviceError, DeviceProvider, LensFacing};
use crate::completion::Completion;
use crate::lifecycle::Lifecycle;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallbackMode {
    Deliver,
    Drop,
    Stall,
}

/// Provider instance handed out by [`MockDeviceProvider`].
#[derive(Debug)]
pub struct MockProviderInstance {
    sensors: Vec<LensFacing>,
}

/// In-process device provider with configurable sensors and failure modes.
///
/// Enforces a single live binding: binding again while a previous lifecycle
/// is still alive fails with [`DeviceError::BindingConflict`].
#[derive(Debug)]
pub struct MockDeviceProvider {
    sensors: Vec<LensFacing>,
    instance_failure: Option<String>,
    mode: CallbackMode,
    bound: Mutex<Option<Lifecycle>>,
    stalled: Mutex<Vec<Completion<Result<MockProviderInstance, DeviceError>>>>,
    next_id: AtomicU64,
    instance_requests: AtomicUsize,
    binds: AtomicUsize,
}

impl Default for MockDeviceProvider {
    fn default() -> Self {
        Self::with_sensors(&[LensFacing::Front, LensFacing::Back])
    }
}

impl MockDeviceProvider {
    /// Provider with a front and a back sensor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider exposing only the given sensors.
    pub fn with_sensors(sensors: &[LensFacing]) -> Self {
        Self {
            sensors: sensors.to_vec(),
            instance_failure: None,
            mode: CallbackMode::Deliver,
            bound: Mutex::new(None),
            stalled: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            instance_requests: AtomicUsize::new(0),
            binds: AtomicUsize::new(0),
        }
    }

    /// Makes instance acquisition fail with a provider error.
    pub fn failing_instance(mut self, reason: impl Into<String>) -> Self {
        self.instance_failure = Some(reason.into());
        self
    }

    /// Drops the instance callback without answering.
    pub fn dropping_callback(mut self) -> Self {
        self.mode = CallbackMode::Drop;
        self
    }

    /// Holds the instance callback forever.
    pub fn stalled(mut self) -> Self {
        self.mode = CallbackMode::Stall;
        self
    }

    /// Number of `get_instance` calls received.
    pub fn instance_requests(&self) -> usize {
        self.instance_requests.load(Ordering::SeqCst)
    }

    /// Number of successful bindings.
    pub fn bind_count(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }
}

impl DeviceProvider for MockDeviceProvider {
    type Instance = MockProviderInstance;

    fn get_instance(&self, reply: Completion<Result<Self::Instance, DeviceError>>) {
        self.instance_requests.fetch_add(1, Ordering::SeqCst);

        match self.mode {
            CallbackMode::Deliver => {
                let result = match &self.instance_failure {
                    Some(reason) => Err(DeviceError::Provider(reason.clone())),
                    None => Ok(MockProviderInstance {
                        sensors: self.sensors.clone(),
                    }),
                };
                reply.complete(result);
            }
            CallbackMode::Drop => drop(reply),
            CallbackMode::Stall => self
                .stalled
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(reply),
        }
    }

    fn bind(
        &self,
        instance: &Self::Instance,
        lifecycle: &Lifecycle,
        lens: LensFacing,
    ) -> Result<CaptureHandle, DeviceError> {
        if !instance.sensors.contains(&lens) {
            return Err(DeviceError::SensorUnavailable(lens));
        }

        let mut bound = self
            .bound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if bound.as_ref().is_some_and(|live| !live.is_torn_down()) {
            return Err(DeviceError::BindingConflict);
        }
        *bound = Some(lifecycle.clone());

        self.binds.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(CaptureHandle::new(id, lens, lifecycle))
    }
}
