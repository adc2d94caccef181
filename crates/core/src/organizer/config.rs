//! Settings for a run.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::config::MetadataSourceConfig;
use crate::placer::PlacerConfig;
use crate::planner::PlannerConfig;

/// Everything a run needs, passed explicitly to each component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerSettings {
    pub raw_root: PathBuf,
    pub extensions: Vec<String>,
    /// Metadata sources, in merge order.
    pub metadata: Vec<MetadataSourceConfig>,
    /// `data_type` allow-list; empty accepts everything.
    #[serde(default)]
    pub data_types: Vec<String>,
    pub planner: PlannerConfig,
    pub placer: PlacerConfig,
}

impl OrganizerSettings {
    /// Short sha256 of the serialized settings, stored with each run.
    pub fn config_hash(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        let digest = format!("{:x}", Sha256::digest(json.as_bytes()));
        Ok(digest[..16].to_string())
    }
}
