//! CLI error types.

use notecache_core::StoreError;
use notecache_sync::SyncError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// No token on the command line or in the environment.
    #[error("a token is required: pass --token or set NOTECACHE_TOKEN")]
    MissingToken,

    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    /// Sync or content retrieval failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Reading the cache directory failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No cache directory for the requested account.
    #[error("no cache found at {}", .0.display())]
    NoCache(PathBuf),

    /// JSON output failed.
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to stdout failed.
    #[error("output failed: {0}")]
    Io(#[from] std::io::Error),
}
