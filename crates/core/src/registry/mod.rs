//! Case registry - one row per case, with the label it was first seen under.
//!
//! The registry is appended to across runs. A case that is already present
//! is never rewritten or duplicated.

mod sqlite;
mod types;

pub use sqlite::SqliteCaseRegistry;
pub use types::*;

use crate::identifier::CaseId;

/// Trait for case registry storage.
pub trait CaseRegistry: Send + Sync {
    /// Add a case if it is not registered yet.
    ///
    /// Returns `true` when the case was new.
    fn register(&self, case_id: &CaseId, label: &str, run_id: &str) -> Result<bool, RegistryError>;

    /// Get one registered case.
    fn get(&self, case_id: &CaseId) -> Result<Option<CaseEntry>, RegistryError>;

    /// All registered cases, in registration order.
    fn list(&self) -> Result<Vec<CaseEntry>, RegistryError>;

    /// Number of registered cases.
    fn count(&self) -> Result<u64, RegistryError>;
}
