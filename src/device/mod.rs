//! Imaging device acquisition and binding.
//!
//! The platform hands out a device provider asynchronously; once it arrives
//! the capture use case is bound to the host [`crate::Lifecycle`] with a lens
//! selector. [`DeviceSession`] wraps both steps into one awaited result.

mod handle;
mod provider;
mod session;

pub use handle::{CaptureHandle, LensFacing};
pub use provider::{MockDeviceProvider, MockProviderInstance};
pub use session::{DeviceError, DeviceProvider, DeviceSession};
