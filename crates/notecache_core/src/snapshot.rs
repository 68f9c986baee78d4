//! Snapshot format for `user.dat`.
//!
//! ```text
//! ┌────────┬─────────────┬──────────────────────────────────────────┐
//! │ "NCSN" │ version u16 │ CBOR map {cursor, notes, notebooks}      │
//! │ 4 B    │ 2 B, LE     │ variable                                 │
//! └────────┴─────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Unknown map fields are ignored and missing optional fields take their
//! defaults, so older readers accept snapshots written by newer minor
//! revisions of the same version.

use crate::error::{StoreError, StoreResult};
use crate::index::EntityIndex;
use notecache_protocol::{Note, Notebook, Usn};
use serde::{Deserialize, Serialize};

/// Magic bytes for snapshot files.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"NCSN";

/// Current snapshot version.
pub const SNAPSHOT_VERSION: u16 = 1;

const HEADER_LEN: usize = 6;

/// Durable state of a replica: cursor plus both indices in iteration order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Highest fully applied sequence number.
    pub cursor: Usn,
    /// Notes in index order.
    pub notes: Vec<Note>,
    /// Notebooks in index order.
    pub notebooks: Vec<Notebook>,
}

/// Borrowed view used for encoding without cloning the indices.
#[derive(Serialize)]
struct SnapshotBody<'a> {
    cursor: Usn,
    notes: Vec<&'a Note>,
    notebooks: Vec<&'a Notebook>,
}

impl Snapshot {
    /// Encodes the given state.
    pub fn encode(
        cursor: Usn,
        notes: &EntityIndex<Note>,
        notebooks: &EntityIndex<Notebook>,
    ) -> StoreResult<Vec<u8>> {
        let body = SnapshotBody {
            cursor,
            notes: notes.iter().collect(),
            notebooks: notebooks.iter().collect(),
        };

        let mut buf = Vec::with_capacity(HEADER_LEN + 64 * (notes.len() + notebooks.len()));
        buf.extend_from_slice(&SNAPSHOT_MAGIC);
        buf.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        ciborium::ser::into_writer(&body, &mut buf)
            .map_err(|e| StoreError::invalid_snapshot(format!("encoding failed: {e}")))?;
        Ok(buf)
    }

    /// Decodes a snapshot.
    pub fn decode(data: &[u8]) -> StoreResult<Self> {
        if data.len() < HEADER_LEN || data[0..4] != SNAPSHOT_MAGIC {
            return Err(StoreError::invalid_snapshot("invalid snapshot magic"));
        }

        let version = u16::from_le_bytes([data[4], data[5]]);
        if version > SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: version,
                supported: SNAPSHOT_VERSION,
            });
        }

        ciborium::de::from_reader(&data[HEADER_LEN..])
            .map_err(|e| StoreError::invalid_snapshot(format!("decoding failed: {e}")))
    }

    /// Rebuilds the note index.
    pub fn note_index(&self) -> EntityIndex<Note> {
        EntityIndex::from_records(self.notes.iter().cloned())
    }

    /// Rebuilds the notebook index.
    pub fn notebook_index(&self) -> EntityIndex<Notebook> {
        EntityIndex::from_records(self.notebooks.iter().cloned())
    }
}
