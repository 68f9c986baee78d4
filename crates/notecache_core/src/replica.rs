//! The local replica: cursor, indices and content store.

use crate::content::ContentStore;
use crate::dir::CacheDir;
use crate::error::StoreResult;
use crate::index::{EntityIndex, Upsert};
use crate::snapshot::Snapshot;
use notecache_protocol::{Note, Notebook, SyncChunk, Usn};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Counts of what a chunk changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkSummary {
    /// Notes inserted or replaced.
    pub notes_upserted: u64,
    /// Notes removed.
    pub notes_expunged: u64,
    /// Notebooks inserted or replaced.
    pub notebooks_upserted: u64,
    /// Notebooks removed.
    pub notebooks_expunged: u64,
    /// Content files deleted.
    pub contents_invalidated: u64,
}

impl ChunkSummary {
    /// Adds another summary to this one.
    pub fn accumulate(&mut self, other: &ChunkSummary) {
        self.notes_upserted += other.notes_upserted;
        self.notes_expunged += other.notes_expunged;
        self.notebooks_upserted += other.notebooks_upserted;
        self.notebooks_expunged += other.notebooks_expunged;
        self.contents_invalidated += other.contents_invalidated;
    }
}

/// Local mirror of one account.
///
/// The cursor only moves in [`Replica::commit`], after the snapshot that
/// reflects it is durably written.
#[derive(Debug)]
pub struct Replica {
    dir: CacheDir,
    contents: ContentStore,
    cursor: Usn,
    notes: EntityIndex<Note>,
    notebooks: EntityIndex<Notebook>,
}

impl Replica {
    /// Opens the replica stored in `path`.
    ///
    /// A missing snapshot yields cursor zero and empty indices. Content files
    /// for notes the snapshot does not hold are deleted: they were fetched
    /// for notes applied after the last commit, and a replay could not
    /// invalidate them.
    pub fn open(path: &Path, create_if_missing: bool) -> StoreResult<Self> {
        let dir = CacheDir::open(path, create_if_missing)?;
        let snapshot = dir.load_snapshot()?.unwrap_or_default();
        let notes = snapshot.note_index();
        let contents = ContentStore::new(dir.path());
        let orphans = contents.retain(|guid| notes.contains(guid))?;

        debug!(
            path = %dir.path().display(),
            cursor = %snapshot.cursor,
            notes = notes.len(),
            notebooks = snapshot.notebooks.len(),
            orphans,
            "opened replica"
        );

        Ok(Self {
            contents,
            cursor: snapshot.cursor,
            notes,
            notebooks: snapshot.notebook_index(),
            dir,
        })
    }

    /// Returns the account directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Highest fully applied and persisted sequence number.
    #[must_use]
    pub fn cursor(&self) -> Usn {
        self.cursor
    }

    /// Notes in index order.
    #[must_use]
    pub fn notes(&self) -> &EntityIndex<Note> {
        &self.notes
    }

    /// Notebooks in index order.
    #[must_use]
    pub fn notebooks(&self) -> &EntityIndex<Notebook> {
        &self.notebooks
    }

    /// Content store for this account.
    #[must_use]
    pub fn contents(&self) -> &ContentStore {
        &self.contents
    }

    /// Maps notebook GUIDs to names. Recomputed on every call.
    #[must_use]
    pub fn notebook_title_map(&self) -> HashMap<String, String> {
        self.notebooks
            .iter()
            .map(|nb| (nb.guid.clone(), nb.name.clone()))
            .collect()
    }

    /// Applies one change-log chunk to the indices.
    ///
    /// All content invalidations the chunk implies happen first; only when
    /// they all succeed are the indices mutated, in order: note upserts,
    /// notebook upserts, note expunges, notebook expunges. An I/O error
    /// therefore leaves the indices untouched. The cursor is not moved.
    pub fn apply_chunk(&mut self, chunk: &SyncChunk) -> StoreResult<ChunkSummary> {
        let mut summary = ChunkSummary::default();

        // Presence is judged against the index before the chunk. Only indexed
        // notes can have a content file (`note_content` requires it, `open`
        // sweeps the rest), and within a chunk upserts precede expunges, so a
        // note first seen here has no file to invalidate.
        let touched = chunk
            .notes
            .iter()
            .map(|n| n.guid.as_str())
            .chain(chunk.expunged_notes.iter().map(String::as_str));
        for guid in touched {
            if self.notes.contains(guid) && self.contents.invalidate(guid)? {
                summary.contents_invalidated += 1;
            }
        }

        for note in &chunk.notes {
            match self.notes.upsert(note.clone()) {
                Upsert::Inserted => debug!(guid = %note.guid, "adding note"),
                Upsert::Replaced => debug!(guid = %note.guid, "updating note"),
            }
            summary.notes_upserted += 1;
        }

        for notebook in &chunk.notebooks {
            match self.notebooks.upsert(notebook.clone()) {
                Upsert::Inserted => debug!(guid = %notebook.guid, "adding notebook"),
                Upsert::Replaced => debug!(guid = %notebook.guid, "updating notebook"),
            }
            summary.notebooks_upserted += 1;
        }

        for guid in &chunk.expunged_notes {
            if self.notes.remove(guid).is_some() {
                debug!(guid = %guid, "expunging note");
                summary.notes_expunged += 1;
            }
        }

        for guid in &chunk.expunged_notebooks {
            if self.notebooks.remove(guid).is_some() {
                debug!(guid = %guid, "expunging notebook");
                summary.notebooks_expunged += 1;
            }
        }

        Ok(summary)
    }

    /// Persists the current indices with `cursor` and then advances the
    /// in-memory cursor.
    ///
    /// Returns false without touching the disk if `cursor` is not ahead of
    /// the current one.
    pub fn commit(&mut self, cursor: Usn) -> StoreResult<bool> {
        if cursor <= self.cursor {
            return Ok(false);
        }

        let encoded = Snapshot::encode(cursor, &self.notes, &self.notebooks)?;
        self.dir.save_snapshot(&encoded)?;
        self.cursor = cursor;
        Ok(true)
    }
}
