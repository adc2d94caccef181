//! Placement planner.
//!
//! Joins the raw index with the merged metadata and decides, for every
//! record, where its file should go and whether anything needs to happen.
//! Planning reads the filesystem (to see what is already in place) but never
//! writes to it, so a dry run and a real run started right after it see the
//! same plan.

mod config;
mod placement_planner;
mod types;

pub use config::{FallbackPolicy, LookupMode, PlannerConfig};
pub use placement_planner::PlacementPlanner;
pub use types::{PlacementDecision, PlanOutcome};
