use thiserror::Error;

use super::{ExecutionOutcome, PlacementStatus, RunRecord, StoredOutcome};
use crate::identifier::CaseId;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Filter for querying stored ledger rows
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub run_id: Option<String>,
    pub status: Option<PlacementStatus>,
    pub case_id: Option<CaseId>,
    pub limit: i64,
    pub offset: i64,
}

impl LedgerFilter {
    pub fn new() -> Self {
        Self {
            limit: 1000,
            offset: 0,
            ..Default::default()
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_status(mut self, status: PlacementStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_case_id(mut self, case_id: CaseId) -> Self {
        self.case_id = Some(case_id);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for ledger storage
pub trait LedgerStore: Send + Sync {
    /// Store a finished run and its rows in one transaction
    fn insert_run(&self, run: &RunRecord, outcomes: &[ExecutionOutcome])
        -> Result<(), LedgerError>;

    /// Query stored rows, ordered by run then sequence
    fn query(&self, filter: &LedgerFilter) -> Result<Vec<StoredOutcome>, LedgerError>;

    /// Most recent runs first
    fn runs(&self, limit: i64) -> Result<Vec<RunRecord>, LedgerError>;

    /// The most recently started run, if any
    fn latest_run(&self) -> Result<Option<RunRecord>, LedgerError> {
        Ok(self.runs(1)?.into_iter().next())
    }
}
