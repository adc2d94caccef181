use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::organizer::OrganizerSettings;
use crate::placer::{PlacerConfig, TransferMode};
use crate::planner::{FallbackPolicy, LookupMode, PlannerConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Metadata sources, in merge order.
    #[serde(default)]
    pub metadata: Vec<MetadataSourceConfig>,
    #[serde(default)]
    pub organize: OrganizeConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Input and output roots
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Where the raw downloads live (record-id named folders).
    pub raw_root: PathBuf,
    /// Where per-case folders are created.
    pub organized_root: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("slidecase.db")
}

/// A labelled metadata document on disk
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MetadataSourceConfig {
    /// Class label given to every case found in this source.
    pub label: String,
    pub path: PathBuf,
}

/// How files are placed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganizeConfig {
    #[serde(default)]
    pub mode: TransferMode,
    /// Only report what would happen (default: true).
    #[serde(default = "default_true")]
    pub dry_run: bool,
    #[serde(default)]
    pub overwrite: bool,
    /// Eligible file extensions, without the dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub lookup: LookupMode,
    #[serde(default)]
    pub container_fallback: FallbackPolicy,
    /// Remove source folders left empty by a move.
    #[serde(default = "default_true")]
    pub prune_empty_source_dirs: bool,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            mode: TransferMode::default(),
            dry_run: true,
            overwrite: false,
            extensions: default_extensions(),
            lookup: LookupMode::default(),
            container_fallback: FallbackPolicy::default(),
            prune_empty_source_dirs: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["svs".to_string()]
}

/// Metadata item filter
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Accepted `data_type` values; empty accepts all.
    #[serde(default)]
    pub data_types: Vec<String>,
}

impl Config {
    /// Builds the settings object handed to the organizer.
    pub fn organizer_settings(&self) -> OrganizerSettings {
        OrganizerSettings {
            raw_root: self.paths.raw_root.clone(),
            extensions: self.organize.extensions.clone(),
            metadata: self.metadata.clone(),
            data_types: self.filter.data_types.clone(),
            planner: PlannerConfig {
                organized_root: self.paths.organized_root.clone(),
                overwrite: self.organize.overwrite,
                lookup: self.organize.lookup,
                container_fallback: self.organize.container_fallback,
            },
            placer: PlacerConfig {
                mode: self.organize.mode,
                dry_run: self.organize.dry_run,
                overwrite: self.organize.overwrite,
                prune_empty_source_dirs: self.organize.prune_empty_source_dirs,
                protected_root: Some(self.paths.raw_root.clone()),
            },
        }
    }
}
