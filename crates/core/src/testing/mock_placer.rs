//! Mock placer for testing.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::ledger::{ExecutionOutcome, PlacementStatus};
use crate::placer::{Placer, TransferMode};
use crate::planner::{PlacementDecision, PlanOutcome};

/// Mock implementation of the Placer trait.
///
/// Never touches the filesystem. Records every decision it is given and
/// reports the status a dry run would, except for record ids marked to fail.
#[derive(Debug, Clone, Default)]
pub struct MockPlacer {
    executed: Arc<RwLock<Vec<PlacementDecision>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    runs_started: Arc<RwLock<usize>>,
}

impl MockPlacer {
    /// Create a new mock placer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every decision for this record id come back as `error`.
    pub fn fail_record(&self, record_id: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(record_id.to_string());
        }
    }

    /// Decisions seen so far, in order.
    pub fn executed(&self) -> Vec<PlacementDecision> {
        self.executed.read().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of times `begin_run` was called.
    pub fn runs_started(&self) -> usize {
        self.runs_started.read().map(|n| *n).unwrap_or(0)
    }

    fn should_fail(&self, record_id: &str) -> bool {
        self.failing
            .read()
            .map(|f| f.contains(record_id))
            .unwrap_or(false)
    }
}

impl Placer for MockPlacer {
    fn name(&self) -> &str {
        "mock"
    }

    fn begin_run(&self) {
        if let Ok(mut n) = self.runs_started.write() {
            *n += 1;
        }
    }

    fn execute(&self, decision: &PlacementDecision) -> ExecutionOutcome {
        if let Ok(mut executed) = self.executed.write() {
            executed.push(decision.clone());
        }

        let (status, error) = if self.should_fail(decision.source_record_id()) {
            (PlacementStatus::Error, Some("mock failure".to_string()))
        } else {
            let status = match decision.outcome() {
                PlanOutcome::MissingSource => PlacementStatus::MissingSource,
                PlanOutcome::Exists => PlacementStatus::Exists,
                PlanOutcome::Transfer => {
                    PlacementStatus::for_transfer(TransferMode::Copy, true, decision.is_ambiguous())
                }
            };
            (status, None)
        };

        ExecutionOutcome {
            source_record_id: decision.source_record_id().to_string(),
            case_id: decision.case_id().clone(),
            label: decision.label().to_string(),
            file_name: decision.file_name().map(String::from),
            source_path: decision.source_path().map(|p| p.to_path_buf()),
            destination_path: decision.target_path().map(|p| p.to_path_buf()),
            status,
            error,
        }
    }
}
