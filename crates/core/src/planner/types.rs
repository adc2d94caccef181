//! Types for the placement planner.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::identifier::CaseId;
use crate::metadata::MetadataRecord;

/// What the planner decided for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOutcome {
    /// No candidate file was found.
    MissingSource,
    /// The target already holds a file and overwrite is off.
    Exists,
    /// The chosen source should be copied or moved to the target.
    Transfer,
}

/// The planned action for one record (or one fallback file of a record).
///
/// Built only by the constructors below; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementDecision {
    source_record_id: String,
    case_id: CaseId,
    label: String,
    file_name: Option<String>,
    candidate_sources: Vec<PathBuf>,
    source_path: Option<PathBuf>,
    target_path: Option<PathBuf>,
    outcome: PlanOutcome,
    ambiguous: bool,
    via_fallback: bool,
}

impl PlacementDecision {
    /// A record with no candidate source.
    ///
    /// The target is still computed when a file name was declared, for the
    /// report.
    pub fn missing_source(record: &MetadataRecord, organized_root: &Path) -> Self {
        let target_path = record
            .expected_file_name
            .as_deref()
            .map(|name| target_for(organized_root, &record.case_id, name));

        Self {
            source_record_id: record.source_record_id.clone(),
            case_id: record.case_id.clone(),
            label: record.label.clone(),
            file_name: record.expected_file_name.clone(),
            candidate_sources: Vec::new(),
            source_path: None,
            target_path,
            outcome: PlanOutcome::MissingSource,
            ambiguous: false,
            via_fallback: false,
        }
    }

    /// A record whose source is gone but whose declared target is already
    /// in place, as after a move. `None` unless a file name was declared,
    /// the target exists and `overwrite` is off.
    pub fn already_placed(
        record: &MetadataRecord,
        organized_root: &Path,
        overwrite: bool,
    ) -> Option<Self> {
        if overwrite {
            return None;
        }
        let file_name = record.expected_file_name.as_deref()?;
        let target_path = target_for(organized_root, &record.case_id, file_name);
        if !target_path.is_file() {
            return None;
        }

        Some(Self {
            source_record_id: record.source_record_id.clone(),
            case_id: record.case_id.clone(),
            label: record.label.clone(),
            file_name: Some(file_name.to_string()),
            candidate_sources: Vec::new(),
            source_path: None,
            target_path: Some(target_path),
            outcome: PlanOutcome::Exists,
            ambiguous: false,
            via_fallback: false,
        })
    }

    /// A record with at least one candidate. `chosen` must be one of
    /// `candidates`.
    ///
    /// The outcome is `Exists` when the target is already occupied and
    /// `overwrite` is false, otherwise `Transfer`.
    pub fn located(
        record: &MetadataRecord,
        organized_root: &Path,
        candidates: Vec<PathBuf>,
        chosen: PathBuf,
        file_name: String,
        overwrite: bool,
        via_fallback: bool,
    ) -> Self {
        debug_assert!(candidates.contains(&chosen));

        let target_path = target_for(organized_root, &record.case_id, &file_name);
        let outcome = if target_path.exists() && !overwrite {
            PlanOutcome::Exists
        } else {
            PlanOutcome::Transfer
        };

        Self {
            source_record_id: record.source_record_id.clone(),
            case_id: record.case_id.clone(),
            label: record.label.clone(),
            file_name: Some(file_name),
            ambiguous: candidates.len() > 1,
            candidate_sources: candidates,
            source_path: Some(chosen),
            target_path: Some(target_path),
            outcome,
            via_fallback,
        }
    }

    pub fn source_record_id(&self) -> &str {
        &self.source_record_id
    }

    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    /// Label of the metadata source the record came from.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// All candidate sources, in index order.
    pub fn candidate_sources(&self) -> &[PathBuf] {
        &self.candidate_sources
    }

    /// The source that will be transferred.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.target_path.as_deref()
    }

    pub fn outcome(&self) -> PlanOutcome {
        self.outcome
    }

    /// More than one candidate existed; the first was taken.
    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous
    }

    /// The file was taken by the container fallback, not by name.
    pub fn is_fallback(&self) -> bool {
        self.via_fallback
    }
}

/// `organized_root / case_id / file_name`
fn target_for(organized_root: &Path, case_id: &CaseId, file_name: &str) -> PathBuf {
    organized_root.join(case_id.as_str()).join(file_name)
}
