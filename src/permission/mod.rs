//! Camera permission acquisition.
//!
//! The host answers permission prompts asynchronously, possibly long after
//! the prompt was registered. [`PermissionGate`] turns that exchange into a
//! single awaited [`PermissionOutcome`].

mod gate;
mod prompt;

pub use gate::{PermissionGate, PermissionOutcome, PermissionPrompt};
pub use prompt::{DeferredPrompt, StaticPrompt};
