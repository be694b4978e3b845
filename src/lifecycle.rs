//! Host lifecycle as an explicit cancellation token.

use tokio_util::sync::CancellationToken;

/// Lifetime of the host activation.
///
/// Device bindings and the capture loop are tied to a `Lifecycle`. Calling
/// [`Lifecycle::teardown`] invalidates every [`crate::CaptureHandle`] bound to
/// it and wakes whichever suspension the orchestration is parked on.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    token: CancellationToken,
}

impl Lifecycle {
    /// Creates a live lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests teardown. Idempotent.
    pub fn teardown(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("lifecycle teardown requested");
        }
        self.token.cancel();
    }

    /// Returns true once teardown has been requested.
    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when teardown is requested.
    pub async fn torn_down(&self) {
        self.token.cancelled().await
    }
}
