//! Reporter contract and the log-sink reporter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Per-tick failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The camera could not deliver a frame.
    CaptureFailed,
    /// The frame payload could not be interpreted.
    FrameDecodeFailed,
    /// The inference engine failed.
    InferenceFailed,
}

impl FailureKind {
    /// All kinds, in declaration order.
    pub const ALL: [FailureKind; 3] = [
        FailureKind::CaptureFailed,
        FailureKind::FrameDecodeFailed,
        FailureKind::InferenceFailed,
    ];

    /// Stable snake_case label.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::CaptureFailed => "capture_failed",
            FailureKind::FrameDecodeFailed => "frame_decode_failed",
            FailureKind::InferenceFailed => "inference_failed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Inference succeeded.
    Faces {
        /// Number of faces detected.
        count: usize,
    },
    /// The tick was abandoned.
    Failed {
        /// What went wrong.
        kind: FailureKind,
        /// Failures in a row, including this one.
        consecutive_failures: u64,
    },
}

/// Report delivered once per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based tick number within the loop run.
    pub tick: u64,
    /// Wall-clock time the tick finished.
    pub at: DateTime<Utc>,
    /// Face count or failure.
    pub outcome: TickOutcome,
}

impl TickReport {
    /// Report for a successful tick, stamped now.
    pub fn faces(tick: u64, count: usize) -> Self {
        Self {
            tick,
            at: Utc::now(),
            outcome: TickOutcome::Faces { count },
        }
    }

    /// Report for an abandoned tick, stamped now.
    pub fn failed(tick: u64, kind: FailureKind, consecutive_failures: u64) -> Self {
        Self {
            tick,
            at: Utc::now(),
            outcome: TickOutcome::Failed {
                kind,
                consecutive_failures,
            },
        }
    }
}

/// Fire-and-forget sink for tick reports.
pub trait Reporter: Send + Sync {
    /// Delivers one report. Must not block.
    fn report(&self, report: &TickReport);
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn report(&self, report: &TickReport) {
        (**self).report(report)
    }
}

impl<R: Reporter> Reporter for Option<R> {
    fn report(&self, report: &TickReport) {
        if let Some(reporter) = self {
            reporter.report(report);
        }
    }
}

impl<A: Reporter, B: Reporter> Reporter for (A, B) {
    fn report(&self, report: &TickReport) {
        self.0.report(report);
        self.1.report(report);
    }
}

/// Reports ticks through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, report: &TickReport) {
        match &report.outcome {
            TickOutcome::Faces { count } => {
                tracing::info!(tick = report.tick, faces = count, "number of faces: {}", count);
            }
            TickOutcome::Failed {
                kind,
                consecutive_failures,
            } => {
                tracing::warn!(
                    tick = report.tick,
                    kind = %kind,
                    consecutive_failures,
                    "Tick failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<u64>>);

    impl Reporter for Collect {
        fn report(&self, report: &TickReport) {
            self.0.lock().unwrap().push(report.tick);
        }
    }

    #[test]
    fn test_pair_reports_to_both() {
        let left = Arc::new(Collect::default());
        let right = Arc::new(Collect::default());
        let pair = (left.clone(), right.clone());

        pair.report(&TickReport::faces(1, 2));
        pair.report(&TickReport::failed(2, FailureKind::CaptureFailed, 1));

        assert_eq!(*left.0.lock().unwrap(), vec![1, 2]);
        assert_eq!(*right.0.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_report_constructors() {
        let faces = TickReport::faces(1, 4);
        assert_eq!((faces.tick, faces.outcome), (1, TickOutcome::Faces { count: 4 }));

        let failed = TickReport::failed(2, FailureKind::InferenceFailed, 2);
        assert_eq!(
            failed.outcome,
            TickOutcome::Failed {
                kind: FailureKind::InferenceFailed,
                consecutive_failures: 2
            }
        );
        assert_eq!(FailureKind::FrameDecodeFailed.to_string(), "frame_decode_failed");
    }
}
