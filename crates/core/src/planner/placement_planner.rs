//! Joins the raw index with metadata records.

use std::path::PathBuf;

use super::config::{FallbackPolicy, LookupMode, PlannerConfig};
use super::types::PlacementDecision;
use crate::index::{RawFileRecord, RawIndex};
use crate::metadata::{MetadataRecord, MetadataSet};

/// Produces one decision per record (or per fallback file).
#[derive(Debug, Clone)]
pub struct PlacementPlanner {
    config: PlannerConfig,
}

impl PlacementPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans every record, ordered by case id, then file name, then record id.
    pub fn plan(&self, index: &RawIndex, metadata: &MetadataSet) -> Vec<PlacementDecision> {
        let mut records: Vec<&MetadataRecord> = metadata.iter().collect();
        records.sort_by(|a, b| {
            a.case_id
                .cmp(&b.case_id)
                .then_with(|| a.expected_file_name.cmp(&b.expected_file_name))
                .then_with(|| a.source_record_id.cmp(&b.source_record_id))
        });

        let mut decisions = Vec::with_capacity(records.len());
        for record in records {
            match self.config.lookup {
                LookupMode::FileName => decisions.push(self.plan_by_name(index, record)),
                LookupMode::Container => decisions.extend(self.plan_by_container(index, record)),
            }
        }
        decisions
    }

    fn plan_by_name(&self, index: &RawIndex, record: &MetadataRecord) -> PlacementDecision {
        let candidates = record
            .expected_file_name
            .as_deref()
            .map(|name| index.candidates_by_name(name))
            .unwrap_or_default();

        self.decide(record, &candidates)
    }

    fn plan_by_container(&self, index: &RawIndex, record: &MetadataRecord) -> Vec<PlacementDecision> {
        let files = index.files_in_container(&record.source_record_id);

        let exact: Vec<&RawFileRecord> = match record.expected_file_name.as_deref() {
            Some(name) => files.iter().copied().filter(|f| f.file_name == name).collect(),
            None => Vec::new(),
        };
        if !exact.is_empty() {
            return vec![self.decide(record, &exact)];
        }

        if files.is_empty() || self.config.container_fallback == FallbackPolicy::Disabled {
            if let Some(placed) = self.already_placed(record) {
                return vec![placed];
            }
            tracing::warn!(
                "No source for record {} ({:?}) in folder {}",
                record.source_record_id,
                record.expected_file_name,
                record.source_record_id
            );
            return vec![PlacementDecision::missing_source(
                record,
                &self.config.organized_root,
            )];
        }

        tracing::warn!(
            "Declared file {:?} not in folder {}, placing all {} eligible files found there",
            record.expected_file_name,
            record.source_record_id,
            files.len()
        );
        files
            .into_iter()
            .map(|file| {
                PlacementDecision::located(
                    record,
                    &self.config.organized_root,
                    vec![file.absolute_path.clone()],
                    file.absolute_path.clone(),
                    file.file_name.clone(),
                    self.config.overwrite,
                    true,
                )
            })
            .collect()
    }

    fn already_placed(&self, record: &MetadataRecord) -> Option<PlacementDecision> {
        let placed = PlacementDecision::already_placed(
            record,
            &self.config.organized_root,
            self.config.overwrite,
        )?;
        tracing::debug!(
            "Record {} has no source but is already placed",
            record.source_record_id
        );
        Some(placed)
    }

    /// Takes the first candidate; flags the decision when there are several.
    fn decide(&self, record: &MetadataRecord, candidates: &[&RawFileRecord]) -> PlacementDecision {
        let Some(first) = candidates.first() else {
            if let Some(placed) = self.already_placed(record) {
                return placed;
            }
            tracing::debug!(
                "No candidate for record {} ({:?})",
                record.source_record_id,
                record.expected_file_name
            );
            return PlacementDecision::missing_source(record, &self.config.organized_root);
        };

        if candidates.len() > 1 {
            tracing::warn!(
                "Record {} has {} candidates for {}, using {}",
                record.source_record_id,
                candidates.len(),
                first.file_name,
                first.absolute_path.display()
            );
        }

        let paths: Vec<PathBuf> = candidates.iter().map(|c| c.absolute_path.clone()).collect();
        PlacementDecision::located(
            record,
            &self.config.organized_root,
            paths,
            first.absolute_path.clone(),
            first.file_name.clone(),
            self.config.overwrite,
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::normalize;
    use crate::planner::PlanOutcome;
    use std::path::Path;
    use tempfile::TempDir;

    fn raw(container: &str, name: &str) -> RawFileRecord {
        RawFileRecord {
            file_name: name.to_string(),
            absolute_path: PathBuf::from("/raw").join(container).join(name),
            container_identifier: container.to_string(),
            relative_path: PathBuf::from(container).join(name),
        }
    }

    fn record(id: &str, case: &str, name: &str) -> MetadataRecord {
        MetadataRecord {
            source_record_id: id.to_string(),
            case_id: normalize(case),
            label: "KIRP".to_string(),
            expected_file_name: Some(name.to_string()),
            data_type: None,
            project_id: None,
        }
    }

    fn index(files: Vec<RawFileRecord>) -> RawIndex {
        RawIndex::from_records(PathBuf::from("/raw"), files, 0)
    }

    #[test]
    fn test_plan_orders_by_case_then_name() {
        let temp = TempDir::new().unwrap();
        let metadata: MetadataSet = vec![
            record("f3", "TCGA-ZZ-0001", "a.svs"),
            record("f2", "TCGA-AB-0001", "b.svs"),
            record("f1", "TCGA-AB-0001", "a.svs"),
        ]
        .into_iter()
        .collect();

        let planner = PlacementPlanner::new(PlannerConfig::new(temp.path()));
        let ids: Vec<_> = planner
            .plan(&index(vec![]), &metadata)
            .iter()
            .map(|d| d.source_record_id().to_string())
            .collect();
        assert_eq!(ids, vec!["f1", "f2", "f3"]);
    }

    #[test]
    fn test_plan_missing_source() {
        let temp = TempDir::new().unwrap();
        let metadata: MetadataSet = vec![record("f1", "TCGA-AB-0001", "s1.svs")]
            .into_iter()
            .collect();

        let planner = PlacementPlanner::new(PlannerConfig::new(temp.path()));
        let decisions = planner.plan(&index(vec![raw("u1", "other.svs")]), &metadata);
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].outcome(), PlanOutcome::MissingSource);
    }

    #[test]
    fn test_plan_ambiguous_uses_first_candidate() {
        let temp = TempDir::new().unwrap();
        let metadata: MetadataSet = vec![record("f1", "TCGA-AB-0001", "x.svs")]
            .into_iter()
            .collect();

        let planner = PlacementPlanner::new(PlannerConfig::new(temp.path()));
        let decisions = planner.plan(&index(vec![raw("u2", "x.svs"), raw("u1", "x.svs")]), &metadata);

        let decision = &decisions[0];
        assert!(decision.is_ambiguous());
        assert_eq!(decision.outcome(), PlanOutcome::Transfer);
        assert_eq!(decision.candidate_sources().len(), 2);
        assert_eq!(decision.source_path(), Some(Path::new("/raw/u1/x.svs")));
        assert_eq!(
            decision.target_path().unwrap(),
            temp.path().join("TCGA-AB-0001").join("x.svs")
        );
    }

    #[test]
    fn test_plan_container_exact_match() {
        let temp = TempDir::new().unwrap();
        let metadata: MetadataSet = vec![record("u1", "TCGA-AB-0001", "s1.svs")]
            .into_iter()
            .collect();

        let planner = PlacementPlanner::new(
            PlannerConfig::new(temp.path()).with_lookup(LookupMode::Container),
        );
        let decisions = planner.plan(
            &index(vec![raw("u1", "s1.svs"), raw("u1", "s2.svs"), raw("u2", "s1.svs")]),
            &metadata,
        );

        assert_eq!(decisions.len(), 1);
        assert!(!decisions[0].is_ambiguous());
        assert!(!decisions[0].is_fallback());
        assert_eq!(decisions[0].source_path(), Some(Path::new("/raw/u1/s1.svs")));
    }

    #[test]
    fn test_plan_container_fallback_all_matching() {
        let temp = TempDir::new().unwrap();
        let metadata: MetadataSet = vec![record("u1", "TCGA-AB-0001", "renamed.svs")]
            .into_iter()
            .collect();
        let raw_index = index(vec![raw("u1", "s1.svs"), raw("u1", "s2.svs")]);

        let planner = PlacementPlanner::new(
            PlannerConfig::new(temp.path()).with_lookup(LookupMode::Container),
        );
        let decisions = planner.plan(&raw_index, &metadata);
        assert_eq!(decisions.len(), 2);
        assert!(decisions.iter().all(|d| d.is_fallback()));
        assert_eq!(decisions[0].file_name(), Some("s1.svs"));
        assert_eq!(decisions[1].file_name(), Some("s2.svs"));

        let strict = PlacementPlanner::new(
            PlannerConfig::new(temp.path())
                .with_lookup(LookupMode::Container)
                .with_container_fallback(FallbackPolicy::Disabled),
        );
        let decisions = strict.plan(&raw_index, &metadata);
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].outcome(), PlanOutcome::MissingSource);
    }

    #[test]
    fn test_plan_moved_record_resolves_to_exists() {
        let temp = TempDir::new().unwrap();
        let case_dir = temp.path().join("TCGA-AB-0001");
        std::fs::create_dir_all(&case_dir).unwrap();
        std::fs::write(case_dir.join("s1.svs"), b"slide").unwrap();

        let metadata: MetadataSet = vec![record("u1", "TCGA-AB-0001", "s1.svs")]
            .into_iter()
            .collect();

        for lookup in [LookupMode::FileName, LookupMode::Container] {
            let planner =
                PlacementPlanner::new(PlannerConfig::new(temp.path()).with_lookup(lookup));
            let decisions = planner.plan(&index(vec![]), &metadata);
            assert_eq!(decisions.len(), 1);
            assert_eq!(decisions[0].outcome(), PlanOutcome::Exists, "{:?}", lookup);
            assert!(decisions[0].source_path().is_none());
        }

        let overwriting =
            PlacementPlanner::new(PlannerConfig::new(temp.path()).with_overwrite(true));
        let decisions = overwriting.plan(&index(vec![]), &metadata);
        assert_eq!(decisions[0].outcome(), PlanOutcome::MissingSource);
    }
}
