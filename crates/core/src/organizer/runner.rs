//! Run driver.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::config::OrganizerSettings;
use super::types::{OrganizeError, RunReport};
use crate::index::{RawIndex, RawTreeIndexer};
use crate::ledger::{AuditLedger, LedgerStore, RunRecord};
use crate::metadata::{load_sources, MatchReport, MetadataMatcher, MetadataSet};
use crate::placer::{FsPlacer, Placer};
use crate::planner::{PlacementDecision, PlacementPlanner};
use crate::registry::CaseRegistry;
use crate::snapshot::SnapshotStore;

/// Runs the pipeline over one raw tree.
pub struct Organizer<P: Placer> {
    settings: OrganizerSettings,
    placer: P,
    ledger_store: Option<Arc<dyn LedgerStore>>,
    registry: Option<Arc<dyn CaseRegistry>>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
}

impl Organizer<FsPlacer> {
    /// Organizer with a filesystem placer built from the settings.
    pub fn from_settings(settings: OrganizerSettings) -> Self {
        let placer = FsPlacer::new(settings.placer.clone());
        Self::new(settings, placer)
    }
}

impl<P: Placer> Organizer<P> {
    pub fn new(settings: OrganizerSettings, placer: P) -> Self {
        Self {
            settings,
            placer,
            ledger_store: None,
            registry: None,
            snapshots: None,
        }
    }

    /// Persist each run and its rows.
    pub fn with_ledger_store(mut self, store: Arc<dyn LedgerStore>) -> Self {
        self.ledger_store = Some(store);
        self
    }

    /// Register settled cases after real runs.
    pub fn with_registry(mut self, registry: Arc<dyn CaseRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Save raw index and slide map snapshots.
    pub fn with_snapshot_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(store);
        self
    }

    pub fn settings(&self) -> &OrganizerSettings {
        &self.settings
    }

    pub fn placer(&self) -> &P {
        &self.placer
    }

    /// Scans the raw root. A missing root is fatal.
    pub fn index(&self) -> Result<RawIndex, OrganizeError> {
        let indexer = RawTreeIndexer::new(&self.settings.extensions);
        let index = indexer.index(&self.settings.raw_root)?;

        if index.duplicated_names() > 0 {
            warn!(
                "{} file names appear more than once under {}",
                index.duplicated_names(),
                index.root().display()
            );
        }
        if let Some(store) = &self.snapshots {
            store.save_raw_index(&index)?;
        }
        Ok(index)
    }

    /// Loads and merges the configured metadata sources.
    ///
    /// Missing and unparseable sources are reported, not fatal.
    pub fn match_metadata(&self) -> Result<MatchReport, OrganizeError> {
        let loaded = load_sources(&self.settings.metadata);
        let matcher = MetadataMatcher::new().with_data_types(self.settings.data_types.iter().cloned());

        let mut report = matcher.match_sources(&loaded.sources);
        report.missing_sources = loaded.missing;
        let mut failed = loaded.failed;
        failed.append(&mut report.failed_sources);
        report.failed_sources = failed;

        info!(
            "Matched {} records for {} cases ({} skipped, {} duplicates)",
            report.records.len(),
            report.records.distinct_cases().len(),
            report.skipped.len(),
            report.duplicates.len()
        );

        if let Some(store) = &self.snapshots {
            store.save_slide_map(&report.records)?;
        }
        Ok(report)
    }

    /// Plans every record against the index.
    pub fn plan(&self, index: &RawIndex, metadata: &MetadataSet) -> Vec<PlacementDecision> {
        PlacementPlanner::new(self.settings.planner.clone()).plan(index, metadata)
    }

    /// Runs the whole pipeline once.
    pub fn run(&self) -> Result<RunReport, OrganizeError> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let dry_run = self.settings.placer.dry_run;
        let mode = self.settings.placer.mode;

        info!(
            "Starting run {} ({}, {})",
            run_id,
            mode,
            if dry_run { "dry run" } else { "execute" }
        );

        let index = self.index()?;
        let matched = self.match_metadata()?;
        let decisions = self.plan(&index, &matched.records);

        self.placer.begin_run();
        let mut ledger = AuditLedger::new();
        for decision in &decisions {
            ledger.record(self.placer.execute(decision));
        }

        let summary = ledger.summary();
        let finished_at = Utc::now();

        if let Some(store) = &self.ledger_store {
            let config_hash = self
                .settings
                .config_hash()
                .map_err(|e| OrganizeError::Serialization(e.to_string()))?;
            let record = RunRecord {
                run_id: run_id.clone(),
                started_at,
                finished_at,
                dry_run,
                mode,
                overwrite: self.settings.placer.overwrite,
                config_hash,
                counts: summary.counts_by_name(),
            };
            store.insert_run(&record, ledger.entries())?;
        }

        let mut cases_registered = 0;
        if let (Some(registry), false) = (&self.registry, dry_run) {
            for (case_id, label) in ledger.settled_cases() {
                if registry.register(case_id, label, &run_id)? {
                    cases_registered += 1;
                }
            }
        }

        info!(
            "Run {} finished: {} rows, {} cases, {} newly registered",
            run_id, summary.total, summary.distinct_cases, cases_registered
        );
        for (status, count) in &summary.counts {
            info!("  {}: {}", status, count);
        }

        Ok(RunReport {
            run_id,
            started_at,
            finished_at,
            dry_run,
            mode,
            summary,
            ledger,
            indexed_files: index.len(),
            matched_records: matched.records.len(),
            skipped_items: matched.skipped.len(),
            duplicate_records: matched.duplicates.len(),
            failed_sources: matched.failed_sources,
            missing_sources: matched.missing_sources,
            cases_registered,
        })
    }
}
