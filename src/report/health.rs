//! Tick failure tracking.
//!
//! Per-tick failures never stop the loop, so without a counter a dead camera
//! would look exactly like an empty room. `TickHealth` counts failures in a
//! row and warns once the streak reaches a threshold.

use super::FailureKind;

/// Running tick counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickHealthMetrics {
    /// Kind of the most recent failure, cleared by a success.
    pub last_failure: Option<FailureKind>,
    /// Consecutive successful ticks.
    pub consecutive_successes: u64,
    /// Consecutive failed ticks.
    pub consecutive_failures: u64,
    /// Total ticks recorded.
    pub total_ticks: u64,
    /// Total failed ticks.
    pub total_failures: u64,
}

/// Tracks consecutive tick failures.
#[derive(Debug, Clone)]
pub struct TickHealth {
    metrics: TickHealthMetrics,
    /// Failure streak at which the loop is considered degraded.
    alert_threshold: u64,
}

impl TickHealth {
    /// Creates a tracker that warns after `alert_threshold` failures in a row.
    pub fn new(alert_threshold: u64) -> Self {
        Self {
            metrics: TickHealthMetrics::default(),
            alert_threshold: alert_threshold.max(1),
        }
    }

    /// Records a successful tick.
    pub fn record_success(&mut self) -> &TickHealthMetrics {
        if self.is_degraded() {
            tracing::info!(
                after_failures = self.metrics.consecutive_failures,
                "Capture loop recovered"
            );
        }

        self.metrics.total_ticks += 1;
        self.metrics.consecutive_successes += 1;
        self.metrics.consecutive_failures = 0;
        self.metrics.last_failure = None;
        &self.metrics
    }

    /// Records a failed tick.
    pub fn record_failure(&mut self, kind: FailureKind) -> &TickHealthMetrics {
        self.metrics.total_ticks += 1;
        self.metrics.total_failures += 1;
        self.metrics.consecutive_failures += 1;
        self.metrics.consecutive_successes = 0;
        self.metrics.last_failure = Some(kind);

        if self.metrics.consecutive_failures == self.alert_threshold {
            tracing::warn!(
                consecutive_failures = self.metrics.consecutive_failures,
                last_failure = %kind,
                "Capture loop degraded"
            );
        }
        &self.metrics
    }

    /// Returns true while the failure streak is at or above the threshold.
    pub fn is_degraded(&self) -> bool {
        self.metrics.consecutive_failures >= self.alert_threshold
    }

    pub fn metrics(&self) -> &TickHealthMetrics {
        &self.metrics
    }
}

impl Default for TickHealth {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_degrades_at_threshold() {
        let mut health = TickHealth::new(2);

        health.record_failure(FailureKind::CaptureFailed);
        assert!(!health.is_degraded());

        let metrics = health.record_failure(FailureKind::InferenceFailed);
        assert_eq!(metrics.consecutive_failures, 2);
        assert_eq!(metrics.last_failure, Some(FailureKind::InferenceFailed));
        assert!(health.is_degraded());
    }

    #[test]
    fn test_success_resets_streak() {
        let mut health = TickHealth::default();
        for _ in 0..5 {
            health.record_failure(FailureKind::FrameDecodeFailed);
        }
        assert!(health.is_degraded());

        let metrics = health.record_success();
        assert_eq!(metrics.consecutive_failures, 0);
        assert_eq!(metrics.total_failures, 5);
        assert_eq!(metrics.total_ticks, 6);
        assert!(!health.is_degraded());
    }

    proptest! {
        #[test]
        fn prop_counters_consistent(outcomes in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut health = TickHealth::new(3);
            for &ok in &outcomes {
                if ok {
                    health.record_success();
                } else {
                    health.record_failure(FailureKind::CaptureFailed);
                }
            }

            let m = health.metrics();
            let failures = outcomes.iter().filter(|ok| !**ok).count() as u64;
            let trailing = outcomes.iter().rev().take_while(|ok| !**ok).count() as u64;
            prop_assert_eq!(m.total_ticks, outcomes.len() as u64);
            prop_assert_eq!(m.total_failures, failures);
            prop_assert_eq!(m.consecutive_failures, trailing);
        }
    }
}
