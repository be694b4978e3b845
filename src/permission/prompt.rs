//! Simulated permission prompt providers.

use super::PermissionPrompt;
use crate::completion::Completion;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Prompt that answers immediately with a fixed value.
#[derive(Debug)]
pub struct StaticPrompt {
    already_granted: bool,
    answer: bool,
    prompts: AtomicUsize,
}

impl StaticPrompt {
    /// Creates a prompt with a pre-existing grant state and a fixed answer.
    pub fn new(already_granted: bool, answer: bool) -> Self {
        Self {
            already_granted,
            answer,
            prompts: AtomicUsize::new(0),
        }
    }

    /// Prompt that always grants.
    pub fn granting() -> Self {
        Self::new(true, true)
    }

    /// Prompt that is not pre-granted and is answered with a refusal.
    pub fn denying() -> Self {
        Self::new(false, false)
    }

    /// Number of prompts registered so far.
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl PermissionPrompt for StaticPrompt {
    fn check_granted(&self) -> bool {
        self.already_granted
    }

    fn prompt_once(&self, answer: Completion<bool>) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        answer.complete(self.answer);
    }
}

/// Prompt whose answer is delivered later by the caller, like a dialog the
/// user has not dismissed yet.
#[derive(Debug, Clone, Default)]
pub struct DeferredPrompt {
    inner: Arc<DeferredInner>,
}

#[derive(Debug, Default)]
struct DeferredInner {
    already_granted: bool,
    pending: Mutex<Option<Completion<bool>>>,
    prompts: AtomicUsize,
}

impl DeferredPrompt {
    /// Creates a deferred prompt.
    pub fn new(already_granted: bool) -> Self {
        Self {
            inner: Arc::new(DeferredInner {
                already_granted,
                ..Default::default()
            }),
        }
    }

    /// Answers the registered prompt. Returns false if no prompt is waiting.
    pub fn answer(&self, granted: bool) -> bool {
        match self.take_pending() {
            Some(completion) => {
                completion.complete(granted);
                true
            }
            None => false,
        }
    }

    /// Dismisses the registered prompt without answering.
    pub fn dismiss(&self) {
        drop(self.take_pending());
    }

    /// Number of prompts registered so far.
    pub fn prompt_count(&self) -> usize {
        self.inner.prompts.load(Ordering::SeqCst)
    }

    fn take_pending(&self) -> Option<Completion<bool>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl PermissionPrompt for DeferredPrompt {
    fn check_granted(&self) -> bool {
        self.inner.already_granted
    }

    fn prompt_once(&self, answer: Completion<bool>) {
        self.inner.prompts.fetch_add(1, Ordering::SeqCst);
        *self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(answer);
    }
}
