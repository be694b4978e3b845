//! Prometheus metrics for the capture loop.
//!
//! # Metrics Exposed
//!
//! - `couch_lurker_ticks_total` - Ticks completed
//! - `couch_lurker_tick_failures_total{kind}` - Abandoned ticks by failure kind
//! - `couch_lurker_consecutive_failures` - Current failure streak
//! - `couch_lurker_faces_last` - Face count from the latest successful tick
//! - `couch_lurker_faces_total` - Sum of all reported face counts
//! - `couch_lurker_loop_state` - Orchestration state ordinal
//!
//! With the `metrics` feature, [`MetricsServer`] exposes them over HTTP.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsReporter};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
