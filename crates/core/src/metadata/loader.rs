//! Reading metadata documents from disk.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::MetadataError;
use super::types::{MetadataSource, SourceFailure};
use crate::config::MetadataSourceConfig;

/// Sources that loaded, plus the ones that did not.
#[derive(Debug, Default)]
pub struct LoadedSources {
    /// Parsed documents, in configuration order.
    pub sources: Vec<MetadataSource>,
    /// Configured files that do not exist.
    pub missing: Vec<PathBuf>,
    /// Files that exist but could not be read or parsed.
    pub failed: Vec<SourceFailure>,
}

/// Reads and parses one metadata document.
pub fn load_source(label: &str, path: &Path) -> Result<MetadataSource, MetadataError> {
    if !path.exists() {
        return Err(MetadataError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path).map_err(|e| MetadataError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let document = serde_json::from_str(&contents).map_err(|e| MetadataError::Parse {
        label: label.to_string(),
        message: e.to_string(),
    })?;

    Ok(MetadataSource::new(label, document))
}

/// Loads every configured source. Missing files are warned about and skipped.
pub fn load_sources(configs: &[MetadataSourceConfig]) -> LoadedSources {
    let mut loaded = LoadedSources::default();

    for config in configs {
        match load_source(&config.label, &config.path) {
            Ok(source) => {
                tracing::debug!("Loaded metadata source '{}' from {:?}", config.label, config.path);
                loaded.sources.push(source);
            }
            Err(e) if e.is_missing() => {
                tracing::warn!("{} (label '{}'), continuing without it", e, config.label);
                loaded.missing.push(config.path.clone());
            }
            Err(e) => {
                tracing::error!("{}", e);
                loaded.failed.push(SourceFailure {
                    label: config.label.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_sources_mixed() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.json");
        let broken = temp.path().join("broken.json");
        fs::write(&good, r#"[{"file_id": "f1"}]"#).unwrap();
        fs::write(&broken, "{ not json").unwrap();

        let configs = vec![
            MetadataSourceConfig {
                label: "BRCA".to_string(),
                path: good,
            },
            MetadataSourceConfig {
                label: "KIRP".to_string(),
                path: temp.path().join("absent.json"),
            },
            MetadataSourceConfig {
                label: "LUAD".to_string(),
                path: broken,
            },
        ];

        let loaded = load_sources(&configs);
        assert_eq!(loaded.sources.len(), 1);
        assert_eq!(loaded.sources[0].label, "BRCA");
        assert_eq!(loaded.missing.len(), 1);
        assert_eq!(loaded.failed.len(), 1);
        assert_eq!(loaded.failed[0].label, "LUAD");
    }

    #[test]
    fn test_load_source_not_found() {
        let result = load_source("X", Path::new("/nonexistent/metadata.json"));
        assert!(matches!(result, Err(MetadataError::NotFound { .. })));
    }
}
