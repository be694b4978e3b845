//! Single-shot completions for callback-driven collaborators.
//!
//! Platform collaborators (permission prompts, device providers, cameras,
//! inference engines) answer on their own threads through a callback. A
//! [`Completion`] is that callback: it is consumed by [`Completion::complete`],
//! so it can deliver at most one value. The orchestration task parks on the
//! matching [`Pending`] until the value arrives, without polling.

use thiserror::Error;
use tokio::sync::oneshot;

/// The collaborator dropped its [`Completion`] without delivering a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("completion dropped before a value was delivered")]
pub struct Abandoned;

/// Write side of a single-shot result slot.
#[derive(Debug)]
pub struct Completion<T> {
    tx: oneshot::Sender<T>,
}

/// Read side of a single-shot result slot.
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<T>,
}

/// Creates a connected completion/pending pair.
pub fn completion<T>() -> (Completion<T>, Pending<T>) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx }, Pending { rx })
}

impl<T> Completion<T> {
    /// Delivers the value to the waiting task.
    ///
    /// If the waiter has already gone away (for example after a lifecycle
    /// teardown), the value is dropped here, which runs any release logic it
    /// carries.
    pub fn complete(self, value: T) {
        if self.tx.send(value).is_err() {
            tracing::trace!("completion receiver gone, dropping value");
        }
    }

    /// Returns true if nobody is waiting for the value any more.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T> Pending<T> {
    /// Waits for the value.
    pub async fn wait(self) -> Result<T, Abandoned> {
        self.rx.await.map_err(|_| Abandoned)
    }
}
