//! Failure aggregation for failed runs

use super::{BootError, Phase};
use thiserror::Error;

/// Composite result of a failed run
///
/// The triggering failure is the primary cause; failures raised by
/// listeners while they were being told about it are kept as suppressed
/// causes in the order they occurred.
#[derive(Debug, Error)]
#[error("Application run failed")]
pub struct FailureReport {
    #[source]
    primary: BootError,
    phase: Option<Phase>,
    suppressed: Vec<BootError>,
}

impl FailureReport {
    pub fn primary(&self) -> &BootError {
        &self.primary
    }

    /// The phase in flight when the run failed.
    ///
    /// `None` when the run was rejected before the first phase.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn suppressed(&self) -> &[BootError] {
        &self.suppressed
    }

    pub fn into_primary(self) -> BootError {
        self.primary
    }
}

/// Collects the secondary failures raised during `failed` delivery
#[derive(Debug, Default)]
pub struct FailureAggregator {
    suppressed: Vec<BootError>,
}

impl FailureAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, failure: BootError) {
        tracing::warn!("Suppressed failure: {}", failure);
        self.suppressed.push(failure);
    }

    pub fn len(&self) -> usize {
        self.suppressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppressed.is_empty()
    }

    pub fn into_suppressed(self) -> Vec<BootError> {
        self.suppressed
    }

    /// Build the final report with `primary` as the triggering cause
    pub fn into_report(self, primary: BootError, phase: Option<Phase>) -> FailureReport {
        FailureReport {
            primary,
            phase,
            suppressed: self.suppressed,
        }
    }
}
