//! # notecache core
//!
//! Local durable mirror of a note account.
//!
//! This crate provides:
//! - `EntityIndex`: GUID-keyed ordered mapping with move-to-end upserts
//! - `Snapshot`: the versioned `user.dat` format
//! - `CacheDir`: per-account directory layout, exclusive lock, atomic
//!   snapshot writes
//! - `ContentStore`: one flat file per note body, fetched lazily
//! - `Replica`: cursor + indices + content store, applying change-log chunks
//!
//! ## Layout
//!
//! ```text
//! <cache_root>/<host>/<user_id>/
//! ├─ user.dat        # Snapshot: cursor, notes, notebooks
//! ├─ user.lock       # Advisory lock for the single owner
//! └─ <note_guid>     # Raw note content, one file per fetched note
//! ```
//!
//! ## Key Invariants
//!
//! - The cursor never moves backwards
//! - The snapshot on disk reflects the state as of the last completed commit
//! - A content file, when present, matches the note as last fetched; absence
//!   is the only staleness signal

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod content;
mod dir;
mod error;
mod index;
mod replica;
mod snapshot;

pub use content::ContentStore;
pub use dir::CacheDir;
pub use error::{StoreError, StoreResult};
pub use index::{EntityIndex, Keyed, Upsert};
pub use replica::{ChunkSummary, Replica};
pub use snapshot::{Snapshot, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
