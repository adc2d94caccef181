//! Types for the metadata matcher.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::identifier::CaseId;

/// A labelled metadata document.
#[derive(Debug, Clone)]
pub struct MetadataSource {
    /// Class label applied to every record of this source (e.g. "KIRP").
    pub label: String,
    /// Parsed JSON document.
    pub document: serde_json::Value,
}

impl MetadataSource {
    pub fn new(label: impl Into<String>, document: serde_json::Value) -> Self {
        Self {
            label: label.into(),
            document,
        }
    }
}

/// One metadata entry describing a physical file and its case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// File or record id from the source (usually a UUID).
    pub source_record_id: String,
    /// Case the file belongs to.
    pub case_id: CaseId,
    /// Class label of the source the record came from.
    pub label: String,
    /// File name the source declares for the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_file_name: Option<String>,
    /// Declared data type (e.g. "Slide Image").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Project of the first linked case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Records keyed by `source_record_id`, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct MetadataSet {
    records: Vec<MetadataRecord>,
    positions: HashMap<String, usize>,
}

impl MetadataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record unless its id is already present.
    ///
    /// Returns `false` when the record was dropped as a duplicate.
    pub fn insert(&mut self, record: MetadataRecord) -> bool {
        if self.positions.contains_key(&record.source_record_id) {
            return false;
        }
        self.positions
            .insert(record.source_record_id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, record_id: &str) -> Option<&MetadataRecord> {
        self.positions.get(record_id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, record_id: &str) -> bool {
        self.positions.contains_key(record_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetadataRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct case ids across all records.
    pub fn distinct_cases(&self) -> BTreeSet<&CaseId> {
        self.records.iter().map(|r| &r.case_id).collect()
    }
}

impl FromIterator<MetadataRecord> for MetadataSet {
    fn from_iter<T: IntoIterator<Item = MetadataRecord>>(iter: T) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Why an item was left out of the merged set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No `file_id`/`record_id`/`id` field.
    MissingRecordId,
    /// No entity or case submitter id to derive a case from.
    MissingEntity,
    /// `data_type` not in the configured allow-list.
    FilteredDataType,
    /// The item is not a JSON object.
    NotAnObject,
    /// The case id is not a single plain directory name.
    UnsafeCaseId,
    /// The declared file name is not a plain file name.
    UnsafeFileName,
}

/// An item that was skipped during matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedItem {
    /// Label of the source holding the item.
    pub label: String,
    /// Position of the item within its source.
    pub position: usize,
    /// Record id, when one was present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub reason: SkipReason,
}

/// A source that could not be used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFailure {
    pub label: String,
    pub error: String,
}

/// Result of merging metadata sources.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    /// Merged records.
    pub records: MetadataSet,
    /// Items skipped because they could not be tied to a case.
    pub skipped: Vec<SkippedItem>,
    /// Record ids dropped because an earlier source already had them.
    pub duplicates: Vec<String>,
    /// Sources whose document shape was not recognized.
    pub failed_sources: Vec<SourceFailure>,
    /// Configured source files that did not exist.
    pub missing_sources: Vec<PathBuf>,
}

impl MatchReport {
    /// Whether any configured source failed to load or parse.
    pub fn has_failed_sources(&self) -> bool {
        !self.failed_sources.is_empty()
    }
}
