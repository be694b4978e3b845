//! Permission gate.

use crate::completion::{completion, Completion};

/// Final answer to a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    /// The capability may be used.
    Granted,
    /// The user refused; the activation must stop.
    Denied,
}

impl PermissionOutcome {
    /// Returns true for [`PermissionOutcome::Granted`].
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionOutcome::Granted)
    }
}

impl From<bool> for PermissionOutcome {
    fn from(granted: bool) -> Self {
        if granted {
            PermissionOutcome::Granted
        } else {
            PermissionOutcome::Denied
        }
    }
}

/// Host side of the permission exchange.
pub trait PermissionPrompt: Send + Sync {
    /// Checks the host authorization store without prompting.
    fn check_granted(&self) -> bool;

    /// Registers a prompt. The host answers through `answer` exactly once,
    /// possibly from another thread and possibly much later.
    fn prompt_once(&self, answer: Completion<bool>);
}

/// Resolves camera permission for one activation.
pub struct PermissionGate<P> {
    prompt: P,
}

impl<P: PermissionPrompt> PermissionGate<P> {
    /// Creates a gate over the given prompt provider.
    pub fn new(prompt: P) -> Self {
        Self { prompt }
    }

    /// Returns the underlying prompt provider.
    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Requests the capability, suspending until the host answers.
    ///
    /// Takes `&mut self` so a second request cannot be issued while one is
    /// outstanding. A prompt that drops its answer handle counts as a denial.
    pub async fn request(&mut self) -> PermissionOutcome {
        if self.prompt.check_granted() {
            tracing::debug!("Camera permission already held");
            return PermissionOutcome::Granted;
        }

        let (answer, pending) = completion();
        self.prompt.prompt_once(answer);
        tracing::info!("Camera permission prompt registered, waiting for answer");

        let outcome = match pending.wait().await {
            Ok(granted) => PermissionOutcome::from(granted),
            Err(e) => {
                tracing::warn!(error = %e, "Permission prompt never answered, treating as denied");
                PermissionOutcome::Denied
            }
        };

        tracing::info!(?outcome, "Camera permission resolved");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::{DeferredPrompt, StaticPrompt};
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_existing_grant_skips_prompt() {
        let prompt = DeferredPrompt::new(true);
        let mut gate = PermissionGate::new(prompt.clone());

        assert_eq!(gate.request().await, PermissionOutcome::Granted);
        assert_eq!(prompt.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_waits_for_late_answer() {
        let prompt = DeferredPrompt::new(false);
        let mut gate = PermissionGate::new(prompt.clone());

        let task = tokio::spawn(async move { gate.request().await });
        while prompt.prompt_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!task.is_finished());

        std::thread::spawn(move || assert!(prompt.answer(true)))
            .join()
            .unwrap();
        assert_eq!(task.await.unwrap(), PermissionOutcome::Granted);
    }

    #[tokio::test]
    async fn test_unanswered_prompt_is_denied() {
        let prompt = DeferredPrompt::new(false);
        let mut gate = PermissionGate::new(prompt.clone());

        let task = tokio::spawn(async move { gate.request().await });
        while prompt.prompt_count() == 0 {
            tokio::task::yield_now().await;
        }
        prompt.dismiss();

        assert_eq!(task.await.unwrap(), PermissionOutcome::Denied);
    }

    proptest! {
        #[test]
        fn prop_outcome_matches_answer(already: bool, answer: bool) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let prompt = StaticPrompt::new(already, answer);
            let mut gate = PermissionGate::new(prompt);

            let outcome = rt.block_on(gate.request());

            let expected = PermissionOutcome::from(already || answer);
            prop_assert_eq!(outcome, expected);
            prop_assert_eq!(gate.prompt().prompt_count(), usize::from(!already));
        }
    }
}
