//! Capture orchestration.
//!
//! One task runs permission → device acquisition → capture loop in
//! sequence, publishing its [`LoopState`] as it goes:
//!
//! ```text
//! NotStarted → AwaitingPermission → AcquiringDevice → Running ⟲ → Stopped
//!                      └──────────────────┴──────────────┴────────→ Stopped
//! ```
//!
//! Lifecycle teardown moves any state to `Stopped`.

mod capture_loop;
mod orchestrator;
mod state;

pub use capture_loop::{CaptureDetectLoop, TickError};
pub use orchestrator::{OrchestrationError, Orchestrator};
pub use state::{LoopState, LoopStateMonitor};
