//! Error types for the sync engine.

use notecache_core::StoreError;
use notecache_protocol::{FaultKind, ProtocolError, RemoteFault};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync and content retrieval.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Bad or expired token. Fatal to the session.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network or name-resolution failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the whole operation can be retried.
        retryable: bool,
    },

    /// Remote-side fault reported by the protocol.
    #[error("server error: {0}")]
    Server(String),

    /// Reply could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Local filesystem or snapshot failure.
    #[error("cache store error: {0}")]
    Store(#[from] StoreError),

    /// Content was requested for a note the cache does not know.
    #[error("note not in cache: {0}")]
    UnknownNote(String),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if re-running the failed `sync()` is expected to help.
    ///
    /// Replay from the persisted cursor is idempotent, so transport and
    /// server faults are safe to retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Server(_) => true,
            _ => false,
        }
    }
}

impl From<RemoteFault> for SyncError {
    fn from(fault: RemoteFault) -> Self {
        match fault.kind {
            FaultKind::Auth => SyncError::Auth(fault.message),
            FaultKind::Server => SyncError::Server(fault.message),
        }
    }
}

impl From<ProtocolError> for SyncError {
    fn from(err: ProtocolError) -> Self {
        SyncError::Protocol(err.to_string())
    }
}
