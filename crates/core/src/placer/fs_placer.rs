//! File system placer implementation.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::config::PlacerConfig;
use super::error::PlacerError;
use super::traits::Placer;
use super::types::TransferMode;
use crate::ledger::{ExecutionOutcome, PlacementStatus};
use crate::planner::{PlacementDecision, PlanOutcome};

/// File system based placer implementation.
pub struct FsPlacer {
    config: PlacerConfig,
    /// Destinations handed out during the current run.
    claimed: Mutex<HashSet<PathBuf>>,
}

impl FsPlacer {
    /// Creates a new file system placer with the given configuration.
    pub fn new(config: PlacerConfig) -> Self {
        Self {
            config,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Creates a placer with default configuration (dry-run copy).
    pub fn with_defaults() -> Self {
        Self::new(PlacerConfig::default())
    }

    pub fn config(&self) -> &PlacerConfig {
        &self.config
    }

    /// Attempts to move a file atomically (rename).
    fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination) {
            Ok(()) => Ok(true),
            Err(e) => {
                // Cross-filesystem moves fail with EXDEV (18 on Linux)
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Picks the destination for a transfer and claims it for this run.
    ///
    /// The planned target is kept unless another record already claimed it,
    /// or a move would land on an existing file. In those cases the first
    /// free `_N` name is used. Only existence checks are made, so dry runs
    /// get the same answer as real runs.
    fn claim_destination(&self, target: &Path) -> PathBuf {
        let mut claimed = match self.claimed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let occupied = target.exists();
        let keep = !claimed.contains(target)
            && !(occupied && self.config.mode == TransferMode::Move);

        let destination = if keep {
            target.to_path_buf()
        } else {
            let mut n = 1;
            loop {
                let candidate = suffixed_path(target, n);
                if !candidate.exists() && !claimed.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            }
        };

        if destination != target {
            tracing::warn!(
                "Destination {} is taken, using {}",
                target.display(),
                destination.display()
            );
        }
        claimed.insert(destination.clone());
        destination
    }

    /// Records an already-present target so later records do not reuse it.
    fn claim_existing(&self, target: &Path) {
        match self.claimed.lock() {
            Ok(mut guard) => {
                guard.insert(target.to_path_buf());
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(target.to_path_buf());
            }
        }
    }

    /// Creates parent directories for a path.
    fn ensure_parent_dirs(path: &Path) -> Result<(), PlacerError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| PlacerError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        Ok(())
    }

    fn copy_file(source: &Path, destination: &Path) -> Result<(), PlacerError> {
        fs::copy(source, destination).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound && !source.exists() {
                PlacerError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            }
        })?;
        Ok(())
    }

    fn move_file(source: &Path, destination: &Path) -> Result<(), PlacerError> {
        let renamed = Self::try_atomic_move(source, destination).map_err(|e| {
            PlacerError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        if !renamed {
            tracing::debug!(
                "Cross-device move of {}, copying instead",
                source.display()
            );
            Self::copy_file(source, destination)?;
            fs::remove_file(source).map_err(|e| PlacerError::CleanupFailed {
                path: source.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Removes the source's directory if the move left it empty.
    fn prune_source_dir(&self, source: &Path) {
        let Some(dir) = source.parent() else {
            return;
        };
        if let Some(root) = &self.config.protected_root {
            let canonical = fs::canonicalize(root).unwrap_or_else(|_| root.clone());
            if root.starts_with(dir) || canonical.starts_with(dir) {
                return;
            }
        }

        match fs::read_dir(dir) {
            Ok(mut entries) => {
                if entries.next().is_none() {
                    match fs::remove_dir(dir) {
                        Ok(()) => tracing::debug!("Removed empty directory {}", dir.display()),
                        Err(e) => tracing::warn!(
                            "Failed to remove empty directory {}: {}",
                            dir.display(),
                            e
                        ),
                    }
                }
            }
            Err(e) => tracing::warn!("Failed to read directory {}: {}", dir.display(), e),
        }
    }

    /// Performs the transfer for a decision whose outcome is `Transfer`.
    fn transfer(&self, source: &Path, destination: &Path) -> Result<(), PlacerError> {
        if !source.exists() {
            return Err(PlacerError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        Self::ensure_parent_dirs(destination)?;

        match self.config.mode {
            TransferMode::Copy => Self::copy_file(source, destination)?,
            TransferMode::Move => {
                Self::move_file(source, destination)?;
                if self.config.prune_empty_source_dirs {
                    self.prune_source_dir(source);
                }
            }
        }
        Ok(())
    }
}

impl Placer for FsPlacer {
    fn name(&self) -> &str {
        "fs"
    }

    fn begin_run(&self) {
        match self.claimed.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn execute(&self, decision: &PlacementDecision) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome {
            source_record_id: decision.source_record_id().to_string(),
            case_id: decision.case_id().clone(),
            label: decision.label().to_string(),
            file_name: decision.file_name().map(String::from),
            source_path: decision.source_path().map(Path::to_path_buf),
            destination_path: decision.target_path().map(Path::to_path_buf),
            status: PlacementStatus::MissingSource,
            error: None,
        };

        let (source, target) = match (decision.outcome(), decision.source_path(), decision.target_path()) {
            (PlanOutcome::MissingSource, _, _) => return outcome,
            (PlanOutcome::Exists, _, target) => {
                if let Some(target) = target {
                    self.claim_existing(target);
                }
                outcome.status = PlacementStatus::Exists;
                return outcome;
            }
            (PlanOutcome::Transfer, Some(source), Some(target)) => (source, target),
            (PlanOutcome::Transfer, _, _) => {
                outcome.status = PlacementStatus::Error;
                outcome.error = Some("Transfer planned without source or target".to_string());
                return outcome;
            }
        };

        let destination = self.claim_destination(target);
        outcome.destination_path = Some(destination.clone());

        let status = PlacementStatus::for_transfer(
            self.config.mode,
            self.config.dry_run,
            decision.is_ambiguous(),
        );

        if self.config.dry_run {
            outcome.status = status;
            return outcome;
        }

        match self.transfer(source, &destination) {
            Ok(()) => {
                tracing::info!(
                    "{} {} -> {}",
                    self.config.mode,
                    source.display(),
                    destination.display()
                );
                outcome.status = status;
            }
            Err(e) => {
                tracing::error!("Record {}: {}", decision.source_record_id(), e);
                outcome.status = PlacementStatus::Error;
                outcome.error = Some(e.ledger_message());
            }
        }
        outcome
    }
}

/// `dir/stem_N.ext`, or `dir/name_N` for names without an extension.
pub fn suffixed_path(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::normalize;
    use crate::metadata::MetadataRecord;
    use tempfile::TempDir;

    fn record(id: &str, name: &str) -> MetadataRecord {
        MetadataRecord {
            source_record_id: id.to_string(),
            case_id: normalize("TCGA-AB-0001"),
            label: "KIRP".to_string(),
            expected_file_name: Some(name.to_string()),
            data_type: None,
            project_id: None,
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn decision(id: &str, source: &Path, organized: &Path, overwrite: bool) -> PlacementDecision {
        let name = source.file_name().unwrap().to_string_lossy().into_owned();
        PlacementDecision::located(
            &record(id, &name),
            organized,
            vec![source.to_path_buf()],
            source.to_path_buf(),
            name,
            overwrite,
            false,
        )
    }

    #[test]
    fn test_suffixed_path() {
        assert_eq!(
            suffixed_path(Path::new("/org/C/x.svs"), 1),
            PathBuf::from("/org/C/x_1.svs")
        );
        assert_eq!(
            suffixed_path(Path::new("/org/C/x.tar.gz"), 2),
            PathBuf::from("/org/C/x.tar_2.gz")
        );
        assert_eq!(
            suffixed_path(Path::new("/org/C/README"), 3),
            PathBuf::from("/org/C/README_3")
        );
    }

    #[test]
    fn test_copy_keeps_source() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("raw/u1/s1.svs");
        let organized = temp.path().join("organized");
        write(&source, "slide");

        let placer = FsPlacer::new(PlacerConfig::default().with_dry_run(false));
        let outcome = placer.execute(&decision("f1", &source, &organized, false));

        let dest = organized.join("TCGA-AB-0001/s1.svs");
        assert_eq!(outcome.status, PlacementStatus::Copied);
        assert_eq!(outcome.destination_path, Some(dest.clone()));
        assert_eq!(fs::read_to_string(dest).unwrap(), "slide");
        assert!(source.exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("raw/u1/s1.svs");
        let organized = temp.path().join("organized");
        write(&source, "slide");

        let placer = FsPlacer::new(PlacerConfig::default().with_mode(TransferMode::Move));
        let outcome = placer.execute(&decision("f1", &source, &organized, false));

        assert_eq!(outcome.status, PlacementStatus::Planned);
        assert_eq!(
            outcome.destination_path,
            Some(organized.join("TCGA-AB-0001/s1.svs"))
        );
        assert!(!organized.exists());
        assert!(source.exists());
    }

    #[test]
    fn test_move_prunes_empty_source_dir() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("raw");
        let source = raw.join("u1/s1.svs");
        let organized = temp.path().join("organized");
        write(&source, "slide");

        let placer = FsPlacer::new(
            PlacerConfig::default()
                .with_mode(TransferMode::Move)
                .with_dry_run(false)
                .with_protected_root(&raw),
        );
        let outcome = placer.execute(&decision("f1", &source, &organized, false));

        assert_eq!(outcome.status, PlacementStatus::Moved);
        assert!(organized.join("TCGA-AB-0001/s1.svs").exists());
        assert!(!source.exists());
        assert!(!raw.join("u1").exists());
        assert!(raw.exists());
    }

    #[test]
    fn test_move_keeps_non_empty_source_dir() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("raw/u1/s1.svs");
        write(&source, "slide");
        write(&temp.path().join("raw/u1/annotations.xml"), "<x/>");

        let placer = FsPlacer::new(
            PlacerConfig::default()
                .with_mode(TransferMode::Move)
                .with_dry_run(false),
        );
        placer.execute(&decision("f1", &source, &temp.path().join("organized"), false));

        assert!(temp.path().join("raw/u1/annotations.xml").exists());
    }

    #[test]
    fn test_move_with_overwrite_never_replaces() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("raw/u1/x.svs");
        let second = temp.path().join("raw/u2/x.svs");
        let organized = temp.path().join("organized");
        write(&first, "first");
        write(&second, "second");

        let placer = FsPlacer::new(
            PlacerConfig::default()
                .with_mode(TransferMode::Move)
                .with_dry_run(false)
                .with_overwrite(true),
        );
        placer.begin_run();
        let a = placer.execute(&decision("f1", &first, &organized, true));
        let b = placer.execute(&decision("f2", &second, &organized, true));

        let case_dir = organized.join("TCGA-AB-0001");
        assert_eq!(a.destination_path, Some(case_dir.join("x.svs")));
        assert_eq!(b.destination_path, Some(case_dir.join("x_1.svs")));
        assert_eq!(fs::read_to_string(case_dir.join("x.svs")).unwrap(), "first");
        assert_eq!(fs::read_to_string(case_dir.join("x_1.svs")).unwrap(), "second");
    }

    #[test]
    fn test_move_onto_existing_file_uses_next_free_suffix() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("raw/u1/x.svs");
        let organized = temp.path().join("organized");
        write(&source, "new");
        write(&organized.join("TCGA-AB-0001/x.svs"), "old");
        write(&organized.join("TCGA-AB-0001/x_1.svs"), "older");

        let placer = FsPlacer::new(
            PlacerConfig::default()
                .with_mode(TransferMode::Move)
                .with_dry_run(false)
                .with_overwrite(true),
        );
        let outcome = placer.execute(&decision("f1", &source, &organized, true));

        assert_eq!(
            outcome.destination_path,
            Some(organized.join("TCGA-AB-0001/x_2.svs"))
        );
        assert_eq!(
            fs::read_to_string(organized.join("TCGA-AB-0001/x.svs")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_copy_with_overwrite_replaces() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("raw/u1/x.svs");
        let organized = temp.path().join("organized");
        write(&source, "new");
        write(&organized.join("TCGA-AB-0001/x.svs"), "old");

        let placer = FsPlacer::new(
            PlacerConfig::default()
                .with_dry_run(false)
                .with_overwrite(true),
        );
        let outcome = placer.execute(&decision("f1", &source, &organized, true));

        assert_eq!(outcome.status, PlacementStatus::Copied);
        assert_eq!(
            fs::read_to_string(organized.join("TCGA-AB-0001/x.svs")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_exists_performs_no_io() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("raw/u1/x.svs");
        let organized = temp.path().join("organized");
        write(&source, "new");
        write(&organized.join("TCGA-AB-0001/x.svs"), "old");

        let placer = FsPlacer::new(PlacerConfig::default().with_dry_run(false));
        let outcome = placer.execute(&decision("f1", &source, &organized, false));

        assert_eq!(outcome.status, PlacementStatus::Exists);
        assert_eq!(
            fs::read_to_string(organized.join("TCGA-AB-0001/x.svs")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_missing_source_outcome() {
        let temp = TempDir::new().unwrap();
        let organized = temp.path().join("organized");
        let missing = PlacementDecision::missing_source(&record("f1", "s1.svs"), &organized);

        let placer = FsPlacer::new(PlacerConfig::default().with_dry_run(false));
        let outcome = placer.execute(&missing);

        assert_eq!(outcome.status, PlacementStatus::MissingSource);
        assert!(outcome.source_path.is_none());
        assert!(!organized.exists());
    }

    #[test]
    fn test_vanished_source_is_error() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("raw/u1/s1.svs");
        let organized = temp.path().join("organized");
        write(&source, "slide");
        let planned = decision("f1", &source, &organized, false);
        fs::remove_file(&source).unwrap();

        let placer = FsPlacer::new(PlacerConfig::default().with_dry_run(false));
        let outcome = placer.execute(&planned);

        assert_eq!(outcome.status, PlacementStatus::Error);
        assert!(outcome.error.unwrap().contains("Source file not found"));
    }

    #[test]
    fn test_dry_run_suffixes_claimed_targets() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("raw/u1/x.svs");
        let second = temp.path().join("raw/u2/x.svs");
        let organized = temp.path().join("organized");
        write(&first, "first");
        write(&second, "second");

        let placer = FsPlacer::with_defaults();
        let a = placer.execute(&decision("f1", &first, &organized, false));
        let b = placer.execute(&decision("f2", &second, &organized, false));
        assert_eq!(b.destination_path, Some(organized.join("TCGA-AB-0001/x_1.svs")));
        assert_eq!(a.status, PlacementStatus::Planned);

        placer.begin_run();
        let again = placer.execute(&decision("f2", &second, &organized, false));
        assert_eq!(again.destination_path, Some(organized.join("TCGA-AB-0001/x.svs")));
    }
}
