//! Failure threshold policy: converts accumulated success/fail counters
//! into a quarantine decision after each probe.

use crate::models::ProxyRecord;

/// Decides when a proxy has failed often enough to be quarantined
#[derive(Debug, Clone)]
pub struct FailureThresholdPolicy {
    failure_threshold: i64,
    min_sample_size: i64,
}

impl FailureThresholdPolicy {
    pub fn new(failure_threshold: i64, min_sample_size: i64) -> Self {
        Self {
            failure_threshold,
            min_sample_size,
        }
    }

    /// Whether the record's counters warrant quarantine.
    ///
    /// Requires at least `min_sample_size` total samples, then quarantines
    /// when `fail_count` reaches the threshold and the failure rate strictly
    /// exceeds one half. Never un-quarantines; reactivation is an explicit
    /// `mark_success` decision.
    pub fn should_quarantine(&self, record: &ProxyRecord) -> bool {
        let total = record.total_samples();
        if total < self.min_sample_size {
            // Not enough evidence either way
            return false;
        }

        record.fail_count >= self.failure_threshold && record.failure_rate() > 0.5
    }
}

impl Default for FailureThresholdPolicy {
    fn default() -> Self {
        Self::new(5, 10)
    }
}
