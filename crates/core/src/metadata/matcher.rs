//! Merging of metadata documents into a [`MetadataSet`].

use serde_json::Value;

use super::error::MetadataError;
use super::types::{
    MatchReport, MetadataRecord, MetadataSet, MetadataSource, SkipReason, SkippedItem,
    SourceFailure,
};
use crate::identifier::{case_id_from_raw_entity, is_single_component};

/// Returns the record list of a metadata document.
///
/// Accepted shapes: `{"data": {"hits": [...]}}`, `{"hits": [...]}` and a bare
/// list.
pub fn document_items<'a>(label: &str, document: &'a Value) -> Result<&'a [Value], MetadataError> {
    if let Some(hits) = document
        .get("data")
        .and_then(|d| d.get("hits"))
        .and_then(Value::as_array)
    {
        return Ok(hits.as_slice());
    }
    if let Some(list) = document.as_array() {
        return Ok(list.as_slice());
    }
    if let Some(hits) = document.get("hits").and_then(Value::as_array) {
        return Ok(hits.as_slice());
    }
    Err(MetadataError::Format {
        label: label.to_string(),
    })
}

/// Builds metadata records from labelled documents.
#[derive(Debug, Clone, Default)]
pub struct MetadataMatcher {
    data_types: Vec<String>,
}

impl MetadataMatcher {
    /// Creates a matcher that accepts every data type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts matching to items whose `data_type` is in the list.
    ///
    /// An empty list accepts everything.
    pub fn with_data_types<I, S>(mut self, data_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_types = data_types.into_iter().map(Into::into).collect();
        self
    }

    /// Merges sources in order. The first occurrence of a record id wins.
    pub fn match_sources(&self, sources: &[MetadataSource]) -> MatchReport {
        let mut report = MatchReport::default();

        for source in sources {
            let items = match document_items(&source.label, &source.document) {
                Ok(items) => items,
                Err(e) => {
                    tracing::error!("{}", e);
                    report.failed_sources.push(SourceFailure {
                        label: source.label.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let before = report.records.len();
            for (position, item) in items.iter().enumerate() {
                match self.extract_record(&source.label, item) {
                    Ok(record) => {
                        let record_id = record.source_record_id.clone();
                        if !report.records.insert(record) {
                            tracing::warn!(
                                "Duplicate record id {} in source '{}' ignored, keeping first occurrence",
                                record_id,
                                source.label
                            );
                            report.duplicates.push(record_id);
                        }
                    }
                    Err(reason) => {
                        let record_id = record_id_of(item).map(String::from);
                        if reason != SkipReason::FilteredDataType {
                            tracing::warn!(
                                "Skipping item {} of source '{}' ({:?}): {:?}",
                                position,
                                source.label,
                                record_id,
                                reason
                            );
                        }
                        report.skipped.push(SkippedItem {
                            label: source.label.clone(),
                            position,
                            record_id,
                            reason,
                        });
                    }
                }
            }

            tracing::info!(
                "Source '{}': {} items, {} new records",
                source.label,
                items.len(),
                report.records.len() - before
            );
        }

        report
    }

    /// Convenience wrapper returning only the merged set.
    pub fn match_records(&self, sources: &[MetadataSource]) -> MetadataSet {
        self.match_sources(sources).records
    }

    fn extract_record(&self, label: &str, item: &Value) -> Result<MetadataRecord, SkipReason> {
        if !item.is_object() {
            return Err(SkipReason::NotAnObject);
        }

        let data_type = str_field(item, "data_type");
        if !self.data_types.is_empty() {
            let accepted = data_type
                .map(|dt| self.data_types.iter().any(|allowed| allowed == dt))
                .unwrap_or(false);
            if !accepted {
                return Err(SkipReason::FilteredDataType);
            }
        }

        let record_id = record_id_of(item).ok_or(SkipReason::MissingRecordId)?;

        let case_id = entity_of(item)
            .map(case_id_from_raw_entity)
            .filter(|c| !c.is_empty())
            .ok_or(SkipReason::MissingEntity)?;
        if !case_id.is_path_safe() {
            return Err(SkipReason::UnsafeCaseId);
        }

        let expected_file_name = str_field(item, "file_name");
        if expected_file_name.is_some_and(|name| !is_single_component(name)) {
            return Err(SkipReason::UnsafeFileName);
        }

        let case = first_case(item);
        if let Some(count) = item.get("cases").and_then(Value::as_array).map(Vec::len) {
            if count > 1 {
                tracing::warn!("Record {} links {} cases, keeping the first", record_id, count);
            }
        }

        Ok(MetadataRecord {
            source_record_id: record_id.to_string(),
            case_id,
            label: label.to_string(),
            expected_file_name: expected_file_name.map(String::from),
            data_type: data_type.map(String::from),
            project_id: case
                .and_then(|c| c.get("project"))
                .and_then(|p| str_field(p, "project_id"))
                .map(String::from),
        })
    }
}

/// Non-empty trimmed string field.
fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn record_id_of(item: &Value) -> Option<&str> {
    ["file_id", "record_id", "id"]
        .iter()
        .find_map(|key| str_field(item, key))
}

/// `cases` may be a list or a single object.
fn first_case(item: &Value) -> Option<&Value> {
    match item.get("cases")? {
        Value::Array(cases) => cases.first(),
        obj @ Value::Object(_) => Some(obj),
        _ => None,
    }
}

/// Entity submitter id of the first associated entity, falling back to the
/// submitter id of the first linked case.
fn entity_of(item: &Value) -> Option<&str> {
    item.get("associated_entities")
        .and_then(Value::as_array)
        .and_then(|entities| entities.first())
        .and_then(|e| str_field(e, "entity_submitter_id"))
        .or_else(|| first_case(item).and_then(|c| str_field(c, "submitter_id")))
}
