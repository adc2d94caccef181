//! Trait definitions for the placer module.

use crate::ledger::ExecutionOutcome;
use crate::planner::PlacementDecision;

/// Applies placement decisions to the filesystem.
///
/// `execute` never fails: transfer errors come back as an outcome with
/// status `error`, so one bad record cannot stop a batch.
pub trait Placer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Called once before the first decision of a run.
    fn begin_run(&self) {}

    /// Applies one decision and reports what happened.
    fn execute(&self, decision: &PlacementDecision) -> ExecutionOutcome;
}
