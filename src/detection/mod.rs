//! Face-detection inference contract.

mod detector;

pub use detector::{DetectStep, FaceDetector, InferenceError, ScriptedDetector};
