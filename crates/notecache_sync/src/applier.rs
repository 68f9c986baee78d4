//! The seam between the sync engine and the local replica.

use crate::error::SyncResult;
use notecache_core::{ChunkSummary, Replica};
use notecache_protocol::{SyncChunk, Usn};

/// Callback for applying remote chunks to local state.
pub trait ChunkApplier {
    /// Highest fully applied and persisted sequence number.
    fn cursor(&self) -> Usn;

    /// Applies one chunk as a unit. Must not move the cursor.
    fn apply_chunk(&mut self, chunk: &SyncChunk) -> SyncResult<ChunkSummary>;

    /// Durably records everything applied so far under `cursor`.
    ///
    /// Returns false if `cursor` is not ahead of the current one.
    fn commit(&mut self, cursor: Usn) -> SyncResult<bool>;
}

impl ChunkApplier for Replica {
    fn cursor(&self) -> Usn {
        Replica::cursor(self)
    }

    fn apply_chunk(&mut self, chunk: &SyncChunk) -> SyncResult<ChunkSummary> {
        Ok(Replica::apply_chunk(self, chunk)?)
    }

    fn commit(&mut self, cursor: Usn) -> SyncResult<bool> {
        Ok(Replica::commit(self, cursor)?)
    }
}
