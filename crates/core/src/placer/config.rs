//! Configuration for the placer module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::TransferMode;

/// Configuration for the file system placer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Copy or move.
    #[serde(default)]
    pub mode: TransferMode,

    /// Decide and report without touching the filesystem.
    #[serde(default = "default_true")]
    pub dry_run: bool,

    /// Replace files already at the target (copy) or place beside them (move).
    #[serde(default)]
    pub overwrite: bool,

    /// Remove a source directory left empty by a move.
    #[serde(default = "default_true")]
    pub prune_empty_source_dirs: bool,

    /// Directory that is never pruned, normally the raw root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected_root: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            mode: TransferMode::Copy,
            dry_run: true,
            overwrite: false,
            prune_empty_source_dirs: true,
            protected_root: None,
        }
    }
}

impl PlacerConfig {
    pub fn with_mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_prune_empty_source_dirs(mut self, prune: bool) -> Self {
        self.prune_empty_source_dirs = prune;
        self
    }

    pub fn with_protected_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.protected_root = Some(root.into());
        self
    }
}
