//! Types for the raw tree index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One eligible file discovered under the raw root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFileRecord {
    /// File name including extension.
    pub file_name: String,
    /// Absolute path of the file.
    pub absolute_path: PathBuf,
    /// Name of the directory holding the file (usually a record id).
    pub container_identifier: String,
    /// Path relative to the raw root.
    pub relative_path: PathBuf,
}

/// Index of a raw tree, keyed by file name and by container directory.
///
/// Records are stored sorted by `(file_name, relative_path)` so candidate
/// lists come out in the same order for the same tree.
#[derive(Debug, Clone, Default)]
pub struct RawIndex {
    root: PathBuf,
    records: Vec<RawFileRecord>,
    by_name: BTreeMap<String, Vec<usize>>,
    by_container: BTreeMap<String, Vec<usize>>,
    unreadable_entries: usize,
}

impl RawIndex {
    /// Builds an index from discovered records.
    pub fn from_records(
        root: PathBuf,
        mut records: Vec<RawFileRecord>,
        unreadable_entries: usize,
    ) -> Self {
        records.sort_by(|a, b| {
            a.file_name
                .cmp(&b.file_name)
                .then_with(|| a.relative_path.cmp(&b.relative_path))
        });

        let mut by_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_container: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_name.entry(record.file_name.clone()).or_default().push(idx);
            by_container
                .entry(record.container_identifier.clone())
                .or_default()
                .push(idx);
        }

        Self {
            root,
            records,
            by_name,
            by_container,
            unreadable_entries,
        }
    }

    /// The absolute raw root this index was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All records in index order.
    pub fn records(&self) -> &[RawFileRecord] {
        &self.records
    }

    /// Files with exactly this name, in index order.
    pub fn candidates_by_name(&self, file_name: &str) -> Vec<&RawFileRecord> {
        self.lookup(&self.by_name, file_name)
    }

    /// Files directly inside a directory with this name, in index order.
    pub fn files_in_container(&self, container: &str) -> Vec<&RawFileRecord> {
        self.lookup(&self.by_container, container)
    }

    fn lookup<'a>(
        &'a self,
        map: &BTreeMap<String, Vec<usize>>,
        key: &str,
    ) -> Vec<&'a RawFileRecord> {
        map.get(key)
            .map(|ids| ids.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct file names.
    pub fn distinct_names(&self) -> usize {
        self.by_name.len()
    }

    /// Number of file names that occur more than once.
    pub fn duplicated_names(&self) -> usize {
        self.by_name.values().filter(|ids| ids.len() > 1).count()
    }

    /// Entries the walk could not read.
    pub fn unreadable_entries(&self) -> usize {
        self.unreadable_entries
    }
}
