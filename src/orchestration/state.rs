//! Observable loop state.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Orchestration progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoopState {
    /// Nothing has happened yet.
    #[default]
    NotStarted,
    /// Waiting on the permission decision.
    AwaitingPermission,
    /// Waiting on the device binding.
    AcquiringDevice,
    /// Ticks are being produced.
    Running,
    /// Terminal.
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::NotStarted => "not_started",
            LoopState::AwaitingPermission => "awaiting_permission",
            LoopState::AcquiringDevice => "acquiring_device",
            LoopState::Running => "running",
            LoopState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Publishes [`LoopState`] to any number of observers.
///
/// Transitions only move forward; once `Stopped` is published the state
/// never changes again.
#[derive(Debug, Clone)]
pub struct LoopStateMonitor {
    tx: Arc<watch::Sender<LoopState>>,
}

impl Default for LoopStateMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopStateMonitor {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LoopState::NotStarted);
        Self { tx: Arc::new(tx) }
    }

    /// Current state.
    pub fn get(&self) -> LoopState {
        *self.tx.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.tx.subscribe()
    }

    /// Publishes `next` if it is ahead of the current state.
    pub(crate) fn advance(&self, next: LoopState) {
        let changed = self.tx.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::debug!(state = %next, "Loop state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        let monitor = LoopStateMonitor::new();
        assert_eq!(monitor.get(), LoopState::NotStarted);

        monitor.advance(LoopState::Running);
        monitor.advance(LoopState::AcquiringDevice);
        assert_eq!(monitor.get(), LoopState::Running);

        monitor.advance(LoopState::Stopped);
        monitor.advance(LoopState::Running);
        assert_eq!(monitor.get(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn test_subscriber_sees_stop() {
        let monitor = LoopStateMonitor::new();
        let mut rx = monitor.subscribe();

        let publisher = monitor.clone();
        tokio::spawn(async move { publisher.advance(LoopState::Stopped) });

        let state = rx.wait_for(|s| *s == LoopState::Stopped).await.unwrap();
        assert_eq!(*state, LoopState::Stopped);
    }
}
