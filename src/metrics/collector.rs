//! Metrics collection and registry.

use crate::orchestration::LoopState;
use crate::report::{FailureKind, Reporter, TickOutcome, TickReport};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for the capture loop.
pub struct MetricsRegistry {
    registry: Registry,

    // Tick metrics
    ticks_total: IntCounter,
    tick_failures_total: IntCounterVec,
    consecutive_failures: IntGauge,

    // Detection metrics
    faces_last: IntGauge,
    faces_total: IntCounter,

    // Orchestration metrics
    loop_state: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all loop metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let ticks_total = IntCounter::new(
            "couch_lurker_ticks_total",
            "Total number of capture ticks completed",
        )?;
        let tick_failures_total = IntCounterVec::new(
            Opts::new(
                "couch_lurker_tick_failures_total",
                "Total number of abandoned ticks by failure kind",
            ),
            &["kind"],
        )?;
        let consecutive_failures = IntGauge::new(
            "couch_lurker_consecutive_failures",
            "Number of consecutive failed ticks",
        )?;
        let faces_last = IntGauge::new(
            "couch_lurker_faces_last",
            "Face count from the most recent successful tick",
        )?;
        let faces_total = IntCounter::new(
            "couch_lurker_faces_total",
            "Sum of face counts over all successful ticks",
        )?;
        let loop_state = IntGauge::new(
            "couch_lurker_loop_state",
            "Orchestration state (0=not started, 1=awaiting permission, 2=acquiring device, 3=running, 4=stopped)",
        )?;

        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(tick_failures_total.clone()))?;
        registry.register(Box::new(consecutive_failures.clone()))?;
        registry.register(Box::new(faces_last.clone()))?;
        registry.register(Box::new(faces_total.clone()))?;
        registry.register(Box::new(loop_state.clone()))?;

        // Export every failure kind at zero rather than omitting it.
        for kind in FailureKind::ALL {
            tick_failures_total.with_label_values(&[kind.as_str()]);
        }

        Ok(Self {
            registry,
            ticks_total,
            tick_failures_total,
            consecutive_failures,
            faces_last,
            faces_total,
            loop_state,
        })
    }

    /// Updates metrics from one tick report.
    pub fn observe(&self, report: &TickReport) {
        self.ticks_total.inc();

        match &report.outcome {
            TickOutcome::Faces { count } => {
                self.faces_last.set(*count as i64);
                self.faces_total.inc_by(*count as u64);
                self.consecutive_failures.set(0);
            }
            TickOutcome::Failed {
                kind,
                consecutive_failures,
            } => {
                self.tick_failures_total
                    .with_label_values(&[kind.as_str()])
                    .inc();
                self.consecutive_failures.set(*consecutive_failures as i64);
            }
        }
    }

    /// Records the current orchestration state.
    pub fn set_state(&self, state: LoopState) {
        self.loop_state.set(state as i64);
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Feeds tick reports into a shared [`MetricsRegistry`].
#[derive(Clone)]
pub struct MetricsReporter {
    registry: Arc<MetricsRegistry>,
}

impl MetricsReporter {
    /// Reporter feeding `registry`.
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }
}

impl Reporter for MetricsReporter {
    fn report(&self, report: &TickReport) {
        self.registry.observe(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_reports_update_metrics() {
        let registry = Arc::new(MetricsRegistry::new().unwrap());
        let reporter = MetricsReporter::new(registry.clone());

        reporter.report(&TickReport::faces(1, 2));
        reporter.report(&TickReport::failed(2, FailureKind::CaptureFailed, 1));
        reporter.report(&TickReport::failed(3, FailureKind::CaptureFailed, 2));
        registry.set_state(LoopState::Running);

        let output = registry.encode().unwrap();
        assert!(output.contains("couch_lurker_ticks_total 3"));
        assert!(output.contains("couch_lurker_faces_last 2"));
        assert!(output.contains("couch_lurker_consecutive_failures 2"));
        assert!(output.contains("couch_lurker_tick_failures_total{kind=\"capture_failed\"} 2"));
        assert!(output.contains("couch_lurker_loop_state 3"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("couch_lurker_ticks_total"));
        assert!(output.contains("couch_lurker_tick_failures_total{kind=\"inference_failed\"} 0"));
        assert!(output.contains("couch_lurker_loop_state"));
    }
}
