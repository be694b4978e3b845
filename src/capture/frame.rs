//! Frame type representing a captured image with metadata.

use std::time::Instant;
use thiserror::Error;

/// Errors raised when a frame payload cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame payload is empty")]
    EmptyPayload,
    #[error("frame payload has {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("unsupported rotation: {0} degrees")]
    InvalidRotation(u32),
}

/// Clockwise rotation needed to display the frame upright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

impl TryFrom<u32> for Rotation {
    type Error = FrameError;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(FrameError::InvalidRotation(other)),
        }
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// A single captured frame.
///
/// A frame may own a platform buffer. The release hook attached with
/// [`Frame::with_release`] runs exactly once, when the frame is dropped or
/// explicitly released, so every exit path frees the buffer.
pub struct Frame {
    /// Raw grayscale pixel data.
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    /// Rotation reported by the sensor, not yet validated.
    rotation_degrees: u32,
    timestamp: Instant,
    sequence: u64,
    release: Option<ReleaseHook>,
}

impl Frame {
    /// Creates a new upright frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            rotation_degrees: 0,
            timestamp: Instant::now(),
            sequence,
            release: None,
        }
    }

    /// Sets the sensor-reported rotation.
    pub fn with_rotation(mut self, degrees: u32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    /// Attaches the hook that frees the underlying buffer.
    pub fn with_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(hook));
        self
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sensor-reported rotation in degrees.
    #[inline]
    pub fn rotation_degrees(&self) -> u32 {
        self.rotation_degrees
    }

    /// When the frame was produced.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Producer-assigned sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Checks that the payload can be handed to inference.
    pub fn decode(&self) -> Result<Rotation, FrameError> {
        if self.pixels.is_empty() {
            return Err(FrameError::EmptyPayload);
        }
        if self.pixels.len() != self.pixel_count() {
            return Err(FrameError::SizeMismatch {
                expected: self.pixel_count(),
                actual: self.pixels.len(),
            });
        }
        Rotation::try_from(self.rotation_degrees)
    }

    /// Frees the underlying buffer now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation_degrees", &self.rotation_degrees)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
