//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while transferring one file.
///
/// These never abort a run; the placer turns them into an `error` ledger row.
#[derive(Debug, Error)]
pub enum PlacerError {
    /// Source file not found.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Failed to create destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy file.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to move/rename file.
    #[error("Failed to move file from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to delete the source after a cross-device move.
    #[error("Failed to remove source file after copy: {path}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacerError {
    /// Creates a copy failed error.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }

    /// Message for the ledger, including the underlying I/O cause.
    pub fn ledger_message(&self) -> String {
        match std::error::Error::source(self) {
            Some(cause) => format!("{}: {}", self, cause),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_ledger_message_includes_cause() {
        let err = PlacerError::copy_failed(
            PathBuf::from("/raw/a.svs"),
            PathBuf::from("/org/C/a.svs"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.ledger_message();
        assert!(message.starts_with("Failed to copy file from /raw/a.svs"));
        assert!(message.ends_with("denied"));

        let missing = PlacerError::SourceNotFound {
            path: PathBuf::from("/raw/a.svs"),
        };
        assert_eq!(missing.ledger_message(), "Source file not found: /raw/a.svs");
    }
}
