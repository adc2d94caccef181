//! Error types for metadata loading.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// The metadata file does not exist.
    #[error("Metadata source not found: {path}")]
    NotFound { path: PathBuf },

    /// The metadata file exists but could not be read.
    #[error("Failed to read metadata source {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata file is not valid JSON.
    #[error("Failed to parse metadata source '{label}': {message}")]
    Parse { label: String, message: String },

    /// The document is JSON but not one of the known shapes.
    #[error("Unrecognized metadata document structure in source '{label}'")]
    Format { label: String },
}

impl MetadataError {
    /// Whether the run may continue without this source.
    ///
    /// Missing files are only warned about; unreadable or malformed documents
    /// are reported as failed sources.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
