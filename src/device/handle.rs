//! Bound capture handle.

use crate::lifecycle::Lifecycle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way the selected sensor faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    /// User-facing sensor.
    #[default]
    Front,
    /// Rear sensor.
    Back,
}

impl fmt::Display for LensFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LensFacing::Front => f.write_str("front"),
            LensFacing::Back => f.write_str("back"),
        }
    }
}

/// A bound, ready imaging device.
///
/// Only valid while the lifecycle it was bound to is alive; capture calls are
/// never issued against an invalidated handle.
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    id: u64,
    lens: LensFacing,
    lifecycle: Lifecycle,
}

impl CaptureHandle {
    /// Creates a handle bound to `lifecycle`. Called by device providers.
    pub fn new(id: u64, lens: LensFacing, lifecycle: &Lifecycle) -> Self {
        Self {
            id,
            lens,
            lifecycle: lifecycle.clone(),
        }
    }

    /// Provider-assigned binding identifier.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Lens facing of the bound sensor.
    #[inline]
    pub fn lens(&self) -> LensFacing {
        self.lens
    }

    /// Returns false once the bound lifecycle has been torn down.
    pub fn is_valid(&self) -> bool {
        !self.lifecycle.is_torn_down()
    }
}
