//! Still capture and frame handling.
//!
//! This module provides the camera contract the capture loop drives, the
//! [`Frame`] type with its exactly-once buffer release, and the crate's file
//! configuration.

mod camera;
mod config;
mod frame;

pub use camera::{Camera, CaptureError, CaptureStep, MockCamera};
pub use config::{CaptureConfig, ConfigError, DetectionConfig, FileConfig, OutputConfig};
pub use frame::{Frame, FrameError, Rotation};
