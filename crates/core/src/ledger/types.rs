use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use crate::identifier::CaseId;
use crate::placer::TransferMode;

/// Final status of one processed unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    MissingSource,
    Exists,
    Planned,
    AmbiguousPlanned,
    Copied,
    AmbiguousCopied,
    Moved,
    AmbiguousMoved,
    Error,
}

impl PlacementStatus {
    pub const ALL: [PlacementStatus; 9] = [
        Self::MissingSource,
        Self::Exists,
        Self::Planned,
        Self::AmbiguousPlanned,
        Self::Copied,
        Self::AmbiguousCopied,
        Self::Moved,
        Self::AmbiguousMoved,
        Self::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSource => "missing_source",
            Self::Exists => "exists",
            Self::Planned => "planned",
            Self::AmbiguousPlanned => "ambiguous_planned",
            Self::Copied => "copied",
            Self::AmbiguousCopied => "ambiguous_copied",
            Self::Moved => "moved",
            Self::AmbiguousMoved => "ambiguous_moved",
            Self::Error => "error",
        }
    }

    /// A file was copied or moved into place by this run.
    pub fn is_placed(&self) -> bool {
        matches!(
            self,
            Self::Copied | Self::AmbiguousCopied | Self::Moved | Self::AmbiguousMoved
        )
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousPlanned | Self::AmbiguousCopied | Self::AmbiguousMoved
        )
    }

    /// Status of a completed (or simulated) transfer.
    pub fn for_transfer(mode: TransferMode, dry_run: bool, ambiguous: bool) -> Self {
        match (dry_run, mode, ambiguous) {
            (true, _, false) => Self::Planned,
            (true, _, true) => Self::AmbiguousPlanned,
            (false, TransferMode::Copy, false) => Self::Copied,
            (false, TransferMode::Copy, true) => Self::AmbiguousCopied,
            (false, TransferMode::Move, false) => Self::Moved,
            (false, TransferMode::Move, true) => Self::AmbiguousMoved,
        }
    }
}

impl fmt::Display for PlacementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlacementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown placement status: {}", s))
    }
}

/// One ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub source_record_id: String,
    pub case_id: CaseId,
    pub label: String,
    pub file_name: Option<String>,
    pub source_path: Option<PathBuf>,
    pub destination_path: Option<PathBuf>,
    pub status: PlacementStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status counts for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total: usize,
    pub distinct_cases: usize,
    pub counts: BTreeMap<PlacementStatus, usize>,
}

impl LedgerSummary {
    pub fn count(&self, status: PlacementStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Counts keyed by status name, for storage.
    pub fn counts_by_name(&self) -> BTreeMap<String, usize> {
        self.counts
            .iter()
            .map(|(status, count)| (status.as_str().to_string(), *count))
            .collect()
    }
}

/// Append-only ledger for a single run.
#[derive(Debug, Clone, Default)]
pub struct AuditLedger {
    entries: Vec<ExecutionOutcome>,
}

impl AuditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: ExecutionOutcome) {
        tracing::debug!(
            "{} {} -> {:?}: {}",
            outcome.case_id,
            outcome.source_record_id,
            outcome.destination_path,
            outcome.status
        );
        self.entries.push(outcome);
    }

    pub fn entries(&self) -> &[ExecutionOutcome] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> LedgerSummary {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.status).or_insert(0) += 1;
        }
        let cases: BTreeSet<&CaseId> = self.entries.iter().map(|e| &e.case_id).collect();

        LedgerSummary {
            total: self.entries.len(),
            distinct_cases: cases.len(),
            counts,
        }
    }

    /// Cases with a file in place after this run, first label seen per case.
    pub fn settled_cases(&self) -> Vec<(&CaseId, &str)> {
        let mut seen: BTreeSet<CaseId> = BTreeSet::new();
        self.entries
            .iter()
            .filter(|e| e.status.is_placed() || e.status == PlacementStatus::Exists)
            .filter(|e| seen.insert(e.case_id.clone()))
            .map(|e| (&e.case_id, e.label.as_str()))
            .collect()
    }

    /// Writes the report as JSON Lines, one row per entry, in ledger order.
    pub fn write_report<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for entry in &self.entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

/// A stored run header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub mode: TransferMode,
    pub overwrite: bool,
    /// Short hash of the settings the run used.
    pub config_hash: String,
    pub counts: BTreeMap<String, usize>,
}

/// A stored ledger row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredOutcome {
    pub run_id: String,
    pub seq: i64,
    pub outcome: ExecutionOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::normalize;

    fn outcome(id: &str, case: &str, status: PlacementStatus) -> ExecutionOutcome {
        ExecutionOutcome {
            source_record_id: id.to_string(),
            case_id: normalize(case),
            label: "KIRP".to_string(),
            file_name: Some(format!("{}.svs", id)),
            source_path: None,
            destination_path: None,
            status,
            error: None,
        }
    }

    #[test]
    fn test_status_names_round_trip() {
        for status in PlacementStatus::ALL {
            assert_eq!(status.as_str().parse::<PlacementStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("bogus".parse::<PlacementStatus>().is_err());
    }

    #[test]
    fn test_status_for_transfer() {
        assert_eq!(
            PlacementStatus::for_transfer(TransferMode::Copy, true, false),
            PlacementStatus::Planned
        );
        assert_eq!(
            PlacementStatus::for_transfer(TransferMode::Move, true, true),
            PlacementStatus::AmbiguousPlanned
        );
        assert_eq!(
            PlacementStatus::for_transfer(TransferMode::Copy, false, false),
            PlacementStatus::Copied
        );
        assert_eq!(
            PlacementStatus::for_transfer(TransferMode::Move, false, true),
            PlacementStatus::AmbiguousMoved
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut ledger = AuditLedger::new();
        ledger.record(outcome("f1", "TCGA-AB-0001", PlacementStatus::Copied));
        ledger.record(outcome("f2", "TCGA-AB-0001", PlacementStatus::Exists));
        ledger.record(outcome("f3", "TCGA-AB-0002", PlacementStatus::MissingSource));

        let summary = ledger.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.distinct_cases, 2);
        assert_eq!(summary.count(PlacementStatus::Copied), 1);
        assert_eq!(summary.count(PlacementStatus::Moved), 0);
        assert_eq!(summary.counts_by_name().get("missing_source"), Some(&1));
    }

    #[test]
    fn test_settled_cases_skip_missing_and_dedupe() {
        let mut ledger = AuditLedger::new();
        ledger.record(outcome("f1", "TCGA-AB-0001", PlacementStatus::Copied));
        ledger.record(outcome("f2", "TCGA-AB-0001", PlacementStatus::Exists));
        ledger.record(outcome("f3", "TCGA-AB-0002", PlacementStatus::MissingSource));
        ledger.record(outcome("f4", "TCGA-AB-0003", PlacementStatus::Planned));

        let cases = ledger.settled_cases();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].0.as_str(), "TCGA-AB-0001");
    }

    #[test]
    fn test_report_is_one_line_per_entry() {
        let mut ledger = AuditLedger::new();
        ledger.record(outcome("f1", "TCGA-AB-0001", PlacementStatus::Planned));
        ledger.record(outcome("f2", "TCGA-AB-0002", PlacementStatus::MissingSource));

        let mut buf = Vec::new();
        ledger.write_report(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let row: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(row["status"], "missing_source");
        assert_eq!(row["case_id"], "TCGA-AB-0002");
    }
}
