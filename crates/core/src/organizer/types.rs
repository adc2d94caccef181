//! Types for the organizer.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use crate::ledger::{AuditLedger, LedgerSummary, PlacementStatus};
use crate::metadata::SourceFailure;
use crate::placer::TransferMode;

/// Errors that abort a run.
///
/// Per-record problems never show up here; they are ledger rows.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Raw root missing or unreadable.
    #[error("index error: {0}")]
    Index(#[from] crate::index::IndexError),

    /// Ledger store error.
    #[error("ledger store error: {0}")]
    Ledger(#[from] crate::ledger::LedgerError),

    /// Case registry error.
    #[error("case registry error: {0}")]
    Registry(#[from] crate::registry::RegistryError),

    /// Snapshot store error.
    #[error("snapshot store error: {0}")]
    Snapshot(#[from] crate::snapshot::SnapshotError),

    /// Settings could not be serialized for hashing.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// What one run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub mode: TransferMode,
    /// One entry per decision, in plan order.
    pub ledger: AuditLedger,
    pub summary: LedgerSummary,
    /// Eligible files found under the raw root.
    pub indexed_files: usize,
    /// Records after merging all sources.
    pub matched_records: usize,
    /// Metadata items that could not be tied to a case.
    pub skipped_items: usize,
    /// Record ids dropped because an earlier source had them.
    pub duplicate_records: usize,
    pub failed_sources: Vec<SourceFailure>,
    pub missing_sources: Vec<PathBuf>,
    /// Cases added to the registry by this run.
    pub cases_registered: usize,
}

impl RunReport {
    pub fn has_failed_sources(&self) -> bool {
        !self.failed_sources.is_empty()
    }

    pub fn count(&self, status: PlacementStatus) -> usize {
        self.summary.count(status)
    }

    /// Number of rows with status `error`.
    pub fn errors(&self) -> usize {
        self.summary.count(PlacementStatus::Error)
    }
}
