//! Configuration for the note cache.

use notecache_protocol::{SyncChunkFilter, MAX_SYNC_ENTRIES};
use std::path::PathBuf;

/// Default service host.
pub const DEFAULT_HOST: &str = "sandbox.evernote.com";

/// Default cache root directory.
pub const DEFAULT_CACHE_ROOT: &str = "data";

/// Configuration for a note cache and its sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Service host; also the second path component of the cache directory.
    pub host: String,
    /// Root under which `<host>/<user_id>/` directories are created.
    pub cache_root: PathBuf,
    /// Maximum entries requested per chunk.
    pub page_size: u32,
    /// What each chunk should carry.
    pub filter: SyncChunkFilter,
}

impl SyncConfig {
    /// Creates a new configuration.
    pub fn new(host: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            cache_root: cache_root.into(),
            page_size: MAX_SYNC_ENTRIES,
            filter: SyncChunkFilter::mirror(),
        }
    }

    /// Sets the page size, clamped to `1..=MAX_SYNC_ENTRIES`.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size.clamp(1, MAX_SYNC_ENTRIES);
        self
    }

    /// Sets the chunk filter.
    pub fn with_filter(mut self, filter: SyncChunkFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Page size actually requested, never above the protocol ceiling.
    pub fn max_entries(&self) -> u32 {
        self.page_size.clamp(1, MAX_SYNC_ENTRIES)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_CACHE_ROOT)
    }
}
