//! Tabular snapshots of the raw index and the merged slide map.
//!
//! The `index` and `match` commands persist their results so the tables can
//! be inspected (or diffed between runs) without rescanning. Each save
//! replaces the previous snapshot.

mod sqlite;

pub use sqlite::SqliteSnapshotStore;

use thiserror::Error;

use crate::index::{RawFileRecord, RawIndex};
use crate::metadata::{MetadataRecord, MetadataSet};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Trait for snapshot storage.
pub trait SnapshotStore: Send + Sync {
    /// Replace the raw index snapshot. Returns the number of rows written.
    fn save_raw_index(&self, index: &RawIndex) -> Result<usize, SnapshotError>;

    /// Replace the slide map snapshot. Returns the number of rows written.
    fn save_slide_map(&self, records: &MetadataSet) -> Result<usize, SnapshotError>;

    /// Raw index rows, ordered by file name then relative path.
    fn raw_index(&self) -> Result<Vec<RawFileRecord>, SnapshotError>;

    /// Slide map rows, ordered by case id then file name.
    fn slide_map(&self) -> Result<Vec<MetadataRecord>, SnapshotError>;
}
