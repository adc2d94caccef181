//! Configuration for the placement planner.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How source files are found for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    /// Look the declared file name up anywhere in the raw tree.
    #[default]
    FileName,
    /// Look inside the folder named after the record id.
    Container,
}

/// What to do when a record's folder lacks the declared file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Place every eligible file found in the folder.
    #[default]
    AllMatching,
    /// Report the record as missing its source.
    #[serde(rename = "none")]
    Disabled,
}

/// Configuration for the placement planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Root of the per-case output tree.
    pub organized_root: PathBuf,
    /// Whether existing targets may be replaced.
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub lookup: LookupMode,
    #[serde(default)]
    pub container_fallback: FallbackPolicy,
}

impl PlannerConfig {
    /// Creates a config with file-name lookup and no overwrite.
    pub fn new(organized_root: impl Into<PathBuf>) -> Self {
        Self {
            organized_root: organized_root.into(),
            overwrite: false,
            lookup: LookupMode::default(),
            container_fallback: FallbackPolicy::default(),
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_lookup(mut self, lookup: LookupMode) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_container_fallback(mut self, policy: FallbackPolicy) -> Self {
        self.container_fallback = policy;
        self
    }
}
