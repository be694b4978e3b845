//! Couch Lurker Library
//!
//! Periodically captures a still from the front camera, counts the faces in
//! it and reports the count, for as long as the host activation is alive.
//!
//! # Architecture
//!
//! One orchestration task runs three stages in sequence:
//!
//! ```text
//! PermissionGate → DeviceSession → CaptureDetectLoop
//!                                   wait → capture → analyze → report ⟲
//! ```
//!
//! Platform collaborators (permission prompt, device provider, camera,
//! inference engine) sit behind traits and answer through single-shot
//! [`completion::Completion`]s. Host teardown is an explicit [`Lifecycle`].
//!
//! # Design Principles
//!
//! - **No polling**: every wait parks the task until a callback or timer fires
//! - **Per-tick isolation**: capture and inference failures are reported, never
//!   propagated out of the loop
//! - **Exactly-once release**: a frame's buffer is freed once on every path,
//!   including cancellation
//!
//! # Example
//!
//! ```no_run
//! use couch_lurker::{
//!     capture::{CaptureConfig, DetectionConfig, MockCamera},
//!     detection::ScriptedDetector,
//!     device::{DeviceSession, MockDeviceProvider},
//!     orchestration::{CaptureDetectLoop, Orchestrator},
//!     permission::{PermissionGate, StaticPrompt},
//!     report::LogReporter,
//!     Lifecycle,
//! };
//!
//! # async fn demo() {
//! let capture_loop = CaptureDetectLoop::new(
//!     MockCamera::new(&CaptureConfig::default()),
//!     ScriptedDetector::with_counts([0, 2, 1]),
//!     LogReporter,
//!     &DetectionConfig::default(),
//! );
//! let mut orchestrator = Orchestrator::new(
//!     PermissionGate::new(StaticPrompt::granting()),
//!     DeviceSession::new(MockDeviceProvider::new()),
//!     capture_loop,
//! );
//!
//! let lifecycle = Lifecycle::new();
//! orchestrator.run(&lifecycle).await.unwrap();
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod completion;
pub mod detection;
pub mod device;
pub mod lifecycle;
pub mod metrics;
pub mod orchestration;
pub mod permission;
pub mod report;

// Re-export commonly used types at crate root
pub use capture::{Camera, CaptureConfig, DetectionConfig, FileConfig, Frame, MockCamera};
pub use completion::{completion, Completion, Pending};
pub use detection::{FaceDetector, ScriptedDetector};
pub use device::{CaptureHandle, DeviceProvider, DeviceSession, LensFacing};
pub use lifecycle::Lifecycle;
pub use orchestration::{CaptureDetectLoop, LoopState, OrchestrationError, Orchestrator};
pub use permission::{PermissionGate, PermissionOutcome, PermissionPrompt};
pub use report::{FailureKind, LogReporter, Reporter, TickReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
