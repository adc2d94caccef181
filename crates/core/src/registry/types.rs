//! Types for the case registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::CaseId;

/// A registered case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseEntry {
    pub case_id: CaseId,
    /// Class label of the metadata source the case was first placed from.
    pub label: String,
    /// When the case was first registered.
    pub first_seen_at: DateTime<Utc>,
    /// Run that registered the case.
    pub first_run_id: String,
}

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    Database(String),
}
