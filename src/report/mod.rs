//! Tick reporting and failure tracking.
//!
//! Every tick ends in exactly one [`TickReport`]: a face count or a failure
//! tagged with its [`FailureKind`]. [`TickHealth`] keeps the running
//! consecutive-failure count that failure reports carry.

mod health;
mod reporter;

pub use health::{TickHealth, TickHealthMetrics};
pub use reporter::{FailureKind, LogReporter, Reporter, TickOutcome, TickReport};
