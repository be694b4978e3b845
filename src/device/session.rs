//! Device session: provider acquisition and lifecycle binding.

use super::{CaptureHandle, LensFacing};
use crate::completion::{completion, Completion};
use crate::lifecycle::Lifecycle;
use thiserror::Error;

/// Errors that can occur while acquiring a capture device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("no {0}-facing sensor available")]
    SensorUnavailable(LensFacing),
    #[error("device provider error: {0}")]
    Provider(String),
    #[error("capture use case already bound to a live lifecycle")]
    BindingConflict,
    #[error("device provider dropped its callback")]
    ProviderDropped,
    #[error("device acquisition cancelled by lifecycle teardown")]
    Cancelled,
}

/// Platform device provider.
///
/// Obtaining the provider instance completes through a callback; binding is
/// synchronous once the instance is available.
pub trait DeviceProvider: Send + Sync {
    /// Provider instance handed back by [`DeviceProvider::get_instance`].
    type Instance: Send + 'static;

    /// Starts fetching the provider instance. Completes exactly once.
    fn get_instance(&self, reply: Completion<Result<Self::Instance, DeviceError>>);

    /// Binds the capture use case to `lifecycle` on the selected sensor.
    fn bind(
        &self,
        instance: &Self::Instance,
        lifecycle: &Lifecycle,
        lens: LensFacing,
    ) -> Result<CaptureHandle, DeviceError>;
}

/// Acquires one bound [`CaptureHandle`] per call.
pub struct DeviceSession<D> {
    provider: D,
    lens: LensFacing,
}

impl<D: DeviceProvider> DeviceSession<D> {
    /// Creates a session selecting the front-facing sensor.
    pub fn new(provider: D) -> Self {
        Self::with_lens(provider, LensFacing::Front)
    }

    /// Creates a session selecting a specific sensor.
    pub fn with_lens(provider: D, lens: LensFacing) -> Self {
        Self { provider, lens }
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &D {
        &self.provider
    }

    /// Fetches the provider and binds the capture device to `lifecycle`.
    ///
    /// Yields exactly one handle or one error. No retries are attempted.
    pub async fn acquire(&self, lifecycle: &Lifecycle) -> Result<CaptureHandle, DeviceError> {
        let (reply, pending) = completion();
        self.provider.get_instance(reply);

        let instance = tokio::select! {
            biased;
            _ = lifecycle.torn_down() => return Err(DeviceError::Cancelled),
            delivered = pending.wait() => delivered.map_err(|_| DeviceError::ProviderDropped)??,
        };

        if lifecycle.is_torn_down() {
            return Err(DeviceError::Cancelled);
        }

        let handle = self.provider.bind(&instance, lifecycle, self.lens)?;
        tracing::info!(
            handle = handle.id(),
            lens = %handle.lens(),
            "Capture device bound to lifecycle"
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockDeviceProvider;

    #[tokio::test]
    async fn test_acquire_binds_front_sensor() {
        let session = DeviceSession::new(MockDeviceProvider::new());
        let lifecycle = Lifecycle::new();

        let handle = session.acquire(&lifecycle).await.unwrap();
        assert_eq!(handle.lens(), LensFacing::Front);
        assert!(handle.is_valid());
        assert_eq!(session.provider().instance_requests(), 1);
    }

    #[tokio::test]
    async fn test_missing_sensor_is_an_error() {
        let provider = MockDeviceProvider::with_sensors(&[LensFacing::Back]);
        let session = DeviceSession::new(provider);

        let result = session.acquire(&Lifecycle::new()).await;
        assert_eq!(
            result.unwrap_err(),
            DeviceError::SensorUnavailable(LensFacing::Front)
        );
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let provider = MockDeviceProvider::new().failing_instance("camera service died");
        let session = DeviceSession::new(provider);

        let result = session.acquire(&Lifecycle::new()).await;
        assert!(matches!(result, Err(DeviceError::Provider(_))));
    }

    #[tokio::test]
    async fn test_second_binding_conflicts_until_teardown() {
        let session = DeviceSession::new(MockDeviceProvider::new());
        let first = Lifecycle::new();
        session.acquire(&first).await.unwrap();

        let second = Lifecycle::new();
        assert_eq!(
            session.acquire(&second).await.unwrap_err(),
            DeviceError::BindingConflict
        );

        first.teardown();
        assert!(session.acquire(&second).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_callback_does_not_hang() {
        let session = DeviceSession::new(MockDeviceProvider::new().dropping_callback());
        let result = session.acquire(&Lifecycle::new()).await;
        assert_eq!(result.unwrap_err(), DeviceError::ProviderDropped);
    }

    #[tokio::test]
    async fn test_teardown_cancels_pending_acquisition() {
        let provider = MockDeviceProvider::new().stalled();
        let session = DeviceSession::new(provider);
        let lifecycle = Lifecycle::new();

        let waiter = lifecycle.clone();
        let acquire = session.acquire(&waiter);
        tokio::pin!(acquire);

        tokio::select! {
            _ = &mut acquire => panic!("acquisition should still be pending"),
            _ = tokio::task::yield_now() => {}
        }
        lifecycle.teardown();

        assert_eq!(acquire.await.unwrap_err(), DeviceError::Cancelled);
        assert_eq!(session.provider().bind_count(), 0);
    }
}
