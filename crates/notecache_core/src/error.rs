//! Error types for the local mirror.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for local store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing the local mirror.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Snapshot file is corrupted or not a snapshot.
    #[error("invalid snapshot: {message}")]
    InvalidSnapshot {
        /// Description of the problem.
        message: String,
    },

    /// Snapshot was written by a newer format version.
    #[error("unsupported snapshot version {found} (supported up to {supported})")]
    UnsupportedVersion {
        /// Version found on disk.
        found: u16,
        /// Highest version this build reads.
        supported: u16,
    },

    /// Another owner holds the cache directory.
    #[error("cache directory is locked by another owner: {}", path.display())]
    Locked {
        /// Locked directory.
        path: PathBuf,
    },

    /// The cache directory does not exist.
    #[error("cache directory does not exist: {}", path.display())]
    MissingDirectory {
        /// Expected directory.
        path: PathBuf,
    },

    /// The cache path exists but is not a directory.
    #[error("cache path is not a directory: {}", path.display())]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },

    /// GUID cannot be used as a content file name.
    #[error("invalid note GUID: {guid:?}")]
    InvalidGuid {
        /// Offending GUID.
        guid: String,
    },
}

impl StoreError {
    /// Creates an invalid snapshot error.
    pub fn invalid_snapshot(message: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            message: message.into(),
        }
    }
}
