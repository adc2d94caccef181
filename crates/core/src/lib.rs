pub mod config;
pub mod identifier;
pub mod index;
pub mod ledger;
pub mod metadata;
pub mod organizer;
pub mod placer;
pub mod planner;
pub mod registry;
pub mod snapshot;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use identifier::{case_id_from_entity_submitter_id, normalize, CaseId};
pub use index::{IndexError, RawFileRecord, RawIndex, RawTreeIndexer};
pub use ledger::{
    AuditLedger, ExecutionOutcome, LedgerError, LedgerFilter, LedgerStore, LedgerSummary,
    PlacementStatus, RunRecord, SqliteLedgerStore,
};
pub use metadata::{MatchReport, MetadataError, MetadataMatcher, MetadataRecord, MetadataSet};
pub use organizer::{OrganizeError, Organizer, OrganizerSettings, RunReport};
pub use placer::{FsPlacer, Placer, PlacerConfig, PlacerError, TransferMode};
pub use planner::{PlacementDecision, PlacementPlanner, PlanOutcome, PlannerConfig};
pub use registry::{CaseEntry, CaseRegistry, RegistryError, SqliteCaseRegistry};
pub use snapshot::{SnapshotError, SnapshotStore, SqliteSnapshotStore};
