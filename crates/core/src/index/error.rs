//! Error types for the raw tree indexer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// The raw root does not exist.
    #[error("Raw root not found: {path}")]
    NotFound { path: PathBuf },

    /// The raw root exists but is not a directory.
    #[error("Raw root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The raw root could not be resolved to an absolute path.
    #[error("Failed to resolve raw root {path}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
