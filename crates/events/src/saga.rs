//! Saga mechanics for ordered, non-transactional multi-record updates.
//!
//! - Steps run sequentially, in a fixed order
//! - No compensation: a failed step never rolls back earlier steps
//! - Each step is individually retryable; runners detect work already done and
//!   report it as [`StepStatus::AlreadyApplied`]
//! - Callers read a per-step report instead of inferring partial failure from logs

use serde::{Deserialize, Serialize};

/// Result of one saga step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum StepStatus {
    /// The step's write was issued and acknowledged.
    Applied,
    /// The effect was already present (previous, partially failed run).
    AlreadyApplied,
    /// The write failed; later steps were still attempted.
    Failed { reason: String },
}

impl StepStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepStatus::Failed { .. })
    }
}

/// One entry of a [`SagaReport`], in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport<K> {
    pub index: usize,
    pub key: K,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Aggregate outcome of a saga run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SagaOutcome {
    Success,
    PartialFailure { failed: usize, attempted: usize },
}

/// Ordered per-step report of a saga run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaReport<K> {
    steps: Vec<StepReport<K>>,
}

impl<K> Default for SagaReport<K> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<K> SagaReport<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next step's result. Indices follow recording order.
    pub fn record(&mut self, key: K, status: StepStatus) {
        let index = self.steps.len();
        self.steps.push(StepReport { index, key, status });
    }

    pub fn steps(&self) -> &[StepReport<K>] {
        &self.steps
    }

    pub fn failed(&self) -> impl Iterator<Item = &StepReport<K>> {
        self.steps.iter().filter(|s| s.status.is_failure())
    }

    pub fn outcome(&self) -> SagaOutcome {
        let failed = self.failed().count();
        if failed == 0 {
            SagaOutcome::Success
        } else {
            SagaOutcome::PartialFailure {
                failed,
                attempted: self.steps.len(),
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome() == SagaOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_success() {
        let report: SagaReport<u32> = SagaReport::new();
        assert!(report.is_success());
        assert!(report.steps().is_empty());
    }

    #[test]
    fn any_failure_yields_partial_failure() {
        let mut report = SagaReport::new();
        report.record("a", StepStatus::Applied);
        report.record(
            "b",
            StepStatus::Failed {
                reason: "disk full".to_string(),
            },
        );
        report.record("c", StepStatus::AlreadyApplied);

        assert_eq!(
            report.outcome(),
            SagaOutcome::PartialFailure {
                failed: 1,
                attempted: 3
            }
        );
        let keys: Vec<_> = report.steps().iter().map(|s| (s.index, s.key)).collect();
        assert_eq!(keys, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn step_status_serializes_flat() {
        let mut report = SagaReport::new();
        report.record(7u32, StepStatus::AlreadyApplied);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["steps"][0]["status"], "already-applied");
        assert_eq!(json["steps"][0]["key"], 7);
    }
}
