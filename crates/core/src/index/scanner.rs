//! Recursive directory walk that builds a [`RawIndex`].

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::error::IndexError;
use super::types::{RawFileRecord, RawIndex};

/// Scans a raw tree for files with eligible extensions.
#[derive(Debug, Clone)]
pub struct RawTreeIndexer {
    extensions: Vec<String>,
}

impl RawTreeIndexer {
    /// Creates an indexer accepting the given extensions.
    ///
    /// Extensions are matched case-insensitively, with or without a leading dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Whether a path carries one of the eligible extensions.
    pub fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    /// Walks `root` and indexes every eligible file.
    pub fn index(&self, root: &Path) -> Result<RawIndex, IndexError> {
        if !root.exists() {
            return Err(IndexError::NotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(IndexError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let root = root.canonicalize().map_err(|e| IndexError::Resolve {
            path: root.to_path_buf(),
            source: e,
        })?;

        let mut records = Vec::new();
        let mut unreadable = 0usize;

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error accessing entry under {}: {}", root.display(), e);
                    unreadable += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_eligible(entry.path()) {
                continue;
            }

            let path = entry.path();
            let relative_path = path.strip_prefix(&root).unwrap_or(path).to_path_buf();
            let container_identifier = path
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            records.push(RawFileRecord {
                file_name: entry.file_name().to_string_lossy().to_string(),
                absolute_path: path.to_path_buf(),
                container_identifier,
                relative_path,
            });
        }

        let index = RawIndex::from_records(PathBuf::from(&root), records, unreadable);
        tracing::info!(
            "Indexed {} files ({} distinct names, {} duplicated) under {}",
            index.len(),
            index.distinct_names(),
            index.duplicated_names(),
            root.display()
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel.as_bytes()).unwrap();
    }

    #[test]
    fn test_index_filters_extensions() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "uuid-1/s1.svs");
        touch(temp.path(), "uuid-1/annotations.txt");
        touch(temp.path(), "uuid-2/S2.SVS");
        touch(temp.path(), "uuid-2/logs/manifest.json");

        let index = RawTreeIndexer::new(["svs"]).index(temp.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.candidates_by_name("s1.svs").len(), 1);
        assert_eq!(index.candidates_by_name("S2.SVS").len(), 1);
    }

    #[test]
    fn test_index_records_paths() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "uuid-1/nested/s1.svs");

        let index = RawTreeIndexer::new([".svs"]).index(temp.path()).unwrap();
        let record = &index.records()[0];
        assert!(record.absolute_path.is_absolute());
        assert!(record.absolute_path.ends_with("uuid-1/nested/s1.svs"));
        assert_eq!(record.relative_path, PathBuf::from("uuid-1/nested/s1.svs"));
        assert_eq!(record.container_identifier, "nested");
    }

    #[test]
    fn test_index_keeps_duplicate_names() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "b/x.svs");
        touch(temp.path(), "a/x.svs");

        let index = RawTreeIndexer::new(["svs"]).index(temp.path()).unwrap();
        let candidates = index.candidates_by_name("x.svs");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].container_identifier, "a");
        assert_eq!(candidates[1].container_identifier, "b");
    }

    #[test]
    fn test_index_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = RawTreeIndexer::new(["svs"]).index(&temp.path().join("nope"));
        assert!(matches!(result, Err(IndexError::NotFound { .. })));
    }

    #[test]
    fn test_index_root_is_file() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "file.svs");
        let result = RawTreeIndexer::new(["svs"]).index(&temp.path().join("file.svs"));
        assert!(matches!(result, Err(IndexError::NotADirectory { .. })));
    }

    #[test]
    fn test_index_is_repeatable() {
        let temp = TempDir::new().unwrap();
        for rel in ["c/z.svs", "a/x.svs", "b/x.svs", "a/y.svs"] {
            touch(temp.path(), rel);
        }

        let indexer = RawTreeIndexer::new(["svs"]);
        let first = indexer.index(temp.path()).unwrap();
        let second = indexer.index(temp.path()).unwrap();
        assert_eq!(first.records(), second.records());
    }
}
