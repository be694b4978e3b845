//! Capture and loop configuration.
//!
//! Loaded from a TOML file; every section falls back to defaults when
//! omitted.

use crate::capture::Rotation;
use crate::device::LensFacing;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest accepted frame, in pixels (64 MP).
pub const MAX_FRAME_PIXELS: u64 = 64 * 1024 * 1024;

/// Configuration for still capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Sensor to bind.
    pub lens: LensFacing,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Rotation the sensor reports, in degrees.
    pub rotation_degrees: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            lens: LensFacing::Front,
            width: 640,
            height: 480,
            rotation_degrees: 270, // front sensors on portrait devices
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        let pixels = u64::from(self.width).checked_mul(u64::from(self.height));
        if pixels.map_or(true, |p| p > MAX_FRAME_PIXELS) {
            return Err(ConfigError::FrameTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        Rotation::try_from(self.rotation_degrees)
            .map_err(|_| ConfigError::InvalidRotation(self.rotation_degrees))?;
        Ok(())
    }
}

/// Configuration for the capture/detect loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Delay between the end of one tick and the start of the next.
    pub period_ms: u64,
    /// Consecutive tick failures before a warning is logged.
    pub failure_alert_threshold: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            period_ms: 5000,
            failure_alert_threshold: 3,
        }
    }
}

impl DetectionConfig {
    /// Tick period as a duration.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        if self.failure_alert_threshold == 0 {
            return Err(ConfigError::InvalidAlertThreshold);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("frame {width}x{height} exceeds {max} pixels", max = MAX_FRAME_PIXELS)]
    FrameTooLarge { width: u32, height: u32 },
    #[error("invalid rotation {0} (must be 0, 90, 180 or 270)")]
    InvalidRotation(u32),
    #[error("invalid tick period (must be non-zero)")]
    InvalidPeriod,
    #[error("invalid failure alert threshold (must be non-zero)")]
    InvalidAlertThreshold,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log every tick report through `tracing`.
    pub log_reports: bool,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_reports: true,
            metrics_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.detection.validate()
    }
}
