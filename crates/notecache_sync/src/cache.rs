//! The note cache facade.

use crate::config::SyncConfig;
use crate::engine::{SyncCycleResult, SyncEngine, SyncState, SyncStats};
use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use notecache_core::{CacheDir, EntityIndex, Replica};
use notecache_protocol::{AuthenticateRequest, Note, Notebook, Usn};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Local mirror of one note account.
///
/// Opening a cache authenticates, locks the account directory and loads the
/// last snapshot; it does not sync. Call [`NoteCache::sync`] to pull
/// changes. Note bodies are fetched lazily by [`NoteCache::note_content`]
/// and kept on disk until a later change to the note invalidates them.
pub struct NoteCache<G: RemoteGateway> {
    engine: SyncEngine<G>,
    replica: Replica,
}

impl<G: RemoteGateway> NoteCache<G> {
    /// Authenticates with `token` and opens the account's cache directory
    /// under `config.cache_root`, creating it if needed.
    pub fn open(token: &str, gateway: G, config: SyncConfig) -> SyncResult<Self> {
        let request = AuthenticateRequest {
            token: token.to_string(),
            host: config.host.clone(),
        };
        let session = gateway.authenticate(&request)?;

        let path = CacheDir::account_path(&config.cache_root, &config.host, session.user_id);
        let replica = Replica::open(&path, true)?;
        info!(
            user_id = session.user_id,
            path = %path.display(),
            cursor = %replica.cursor(),
            "opened note cache"
        );

        Ok(Self {
            engine: SyncEngine::new(config, gateway, session),
            replica,
        })
    }

    /// Pulls every change after the persisted cursor.
    pub fn sync(&mut self) -> SyncResult<SyncCycleResult> {
        self.engine.sync(&mut self.replica)
    }

    /// Cached notes, in the order they were last added or updated.
    pub fn notes(&self) -> &EntityIndex<Note> {
        self.replica.notes()
    }

    /// Cached notebooks, in the order they were last added or updated.
    pub fn notebooks(&self) -> &EntityIndex<Notebook> {
        self.replica.notebooks()
    }

    /// Maps notebook GUIDs to notebook names.
    pub fn notebook_title_map(&self) -> HashMap<String, String> {
        self.replica.notebook_title_map()
    }

    /// Returns the body of a cached note.
    ///
    /// Served from disk when present; otherwise fetched from the server and
    /// written to disk before returning. Fails with `UnknownNote` for a GUID
    /// not in the cache.
    pub fn note_content(&self, guid: &str) -> SyncResult<Vec<u8>> {
        if !self.replica.notes().contains(guid) {
            return Err(SyncError::UnknownNote(guid.to_string()));
        }

        let contents = self.replica.contents();
        if let Some(bytes) = contents.read(guid)? {
            debug!(guid = %guid, "content cache hit");
            return Ok(bytes);
        }

        let bytes = self.engine.fetch_content(guid)?;
        contents.write(guid, &bytes)?;
        debug!(guid = %guid, bytes = bytes.len(), "fetched content");
        Ok(bytes)
    }

    /// Highest persisted sequence number.
    pub fn cursor(&self) -> Usn {
        self.replica.cursor()
    }

    /// Account identifier of the session.
    pub fn user_id(&self) -> i64 {
        self.engine.session().user_id
    }

    /// The account's cache directory.
    pub fn path(&self) -> &Path {
        self.replica.path()
    }

    /// The sync engine's state.
    pub fn state(&self) -> SyncState {
        self.engine.state()
    }

    /// Sync statistics for this cache instance.
    pub fn stats(&self) -> &SyncStats {
        self.engine.stats()
    }

    /// The gateway this cache talks to.
    pub fn gateway(&self) -> &G {
        self.engine.gateway()
    }
}
