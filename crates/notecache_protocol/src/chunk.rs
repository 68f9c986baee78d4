//! Change-log pages.

use crate::types::{Note, Notebook, Usn};
use serde::{Deserialize, Serialize};

/// Protocol ceiling on the number of entries a single chunk may carry.
pub const MAX_SYNC_ENTRIES: u32 = 256;

/// Selects which kinds of change-log entries a chunk carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncChunkFilter {
    /// Include note records.
    pub include_notes: bool,
    /// Include note attributes on note records.
    pub include_note_attributes: bool,
    /// Include notebook records.
    pub include_notebooks: bool,
    /// Include expunge markers.
    pub include_expunged: bool,
}

impl SyncChunkFilter {
    /// The filter the cache uses: notes with attributes, notebooks, expunges.
    pub const fn mirror() -> Self {
        Self {
            include_notes: true,
            include_note_attributes: true,
            include_notebooks: true,
            include_expunged: true,
        }
    }
}

impl Default for SyncChunkFilter {
    fn default() -> Self {
        Self::mirror()
    }
}

/// One page of the server change log.
///
/// Every list may be empty. `chunk_high_usn` is the highest sequence number
/// covered by this page; `None` (or zero) means the server has nothing past
/// the requested point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncChunk {
    /// Highest sequence number in this page.
    pub chunk_high_usn: Option<Usn>,
    /// The account's current change-log head.
    pub update_count: Usn,
    /// Added or updated notes.
    pub notes: Vec<Note>,
    /// Added or updated notebooks.
    pub notebooks: Vec<Notebook>,
    /// GUIDs of permanently deleted notes.
    pub expunged_notes: Vec<String>,
    /// GUIDs of permanently deleted notebooks.
    pub expunged_notebooks: Vec<String>,
}

impl SyncChunk {
    /// Creates an empty chunk reporting the given head and no high mark.
    pub fn empty(update_count: Usn) -> Self {
        Self {
            update_count,
            ..Self::default()
        }
    }

    /// Returns the high-water mark, treating zero as absent.
    pub fn high_mark(&self) -> Option<Usn> {
        self.chunk_high_usn.filter(|usn| !usn.is_zero())
    }

    /// Returns the number of entries carried by this chunk.
    pub fn entry_count(&self) -> usize {
        self.notes.len()
            + self.notebooks.len()
            + self.expunged_notes.len()
            + self.expunged_notebooks.len()
    }

    /// Returns true when the chunk carries no entries.
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}
