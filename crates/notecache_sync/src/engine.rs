//! Sync engine state machine.

use crate::applier::ChunkApplier;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use notecache_core::ChunkSummary;
use notecache_protocol::{ChunkRequest, ContentRequest, Session, Usn};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Engine is idle, no sync has run yet.
    Idle,
    /// Engine is pulling chunks from the server.
    Pulling,
    /// Engine is writing the snapshot for the new cursor.
    Persisting,
    /// Engine has completed a sync cycle.
    Synced,
    /// The last sync cycle failed.
    Error,
}

impl SyncState {
    /// Returns true if the engine is in an active sync state.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncState::Pulling | SyncState::Persisting)
    }
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total number of sync cycles completed.
    pub cycles_completed: u64,
    /// Total number of chunks applied.
    pub chunks_applied: u64,
    /// Total notes inserted or replaced.
    pub notes_upserted: u64,
    /// Total notes removed.
    pub notes_expunged: u64,
    /// Total notebooks inserted or replaced.
    pub notebooks_upserted: u64,
    /// Total notebooks removed.
    pub notebooks_expunged: u64,
    /// Total snapshots written.
    pub snapshots_written: u64,
    /// Last successful sync time.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

impl SyncStats {
    fn record(&mut self, changes: &ChunkSummary) {
        self.notes_upserted += changes.notes_upserted;
        self.notes_expunged += changes.notes_expunged;
        self.notebooks_upserted += changes.notebooks_upserted;
        self.notebooks_expunged += changes.notebooks_expunged;
    }
}

/// Result of a sync cycle.
#[derive(Debug, Clone)]
pub struct SyncCycleResult {
    /// Number of chunks applied.
    pub chunks: u64,
    /// What the applied chunks changed.
    pub changes: ChunkSummary,
    /// Cursor at call entry.
    pub cursor_before: Usn,
    /// Cursor after the cycle.
    pub cursor_after: Usn,
    /// Whether a snapshot was written.
    pub persisted: bool,
    /// Duration of the sync cycle.
    pub duration: Duration,
}

impl SyncCycleResult {
    /// Returns true if the cycle moved the cursor.
    pub fn advanced(&self) -> bool {
        self.cursor_after > self.cursor_before
    }
}

struct Pulled {
    after: Usn,
    chunks: u64,
    changes: ChunkSummary,
}

/// Pulls the server's change log into a [`ChunkApplier`].
pub struct SyncEngine<G: RemoteGateway> {
    config: SyncConfig,
    gateway: G,
    session: Session,
    state: SyncState,
    stats: SyncStats,
}

impl<G: RemoteGateway> SyncEngine<G> {
    /// Creates a new sync engine for an authenticated session.
    pub fn new(config: SyncConfig, gateway: G, session: Session) -> Self {
        Self {
            config,
            gateway,
            session,
            state: SyncState::Idle,
            stats: SyncStats::default(),
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Gets the gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Gets the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Gets the current stats.
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Brings `applier` up to the server's change-log head.
    ///
    /// Chunks strictly after the applier's cursor are requested and applied
    /// one at a time. The cursor is committed once, at the end, and only if
    /// it advanced. Any error aborts the cycle without committing; chunks
    /// applied before the failure stay applied, and replaying them on the
    /// next call is harmless.
    pub fn sync<A: ChunkApplier>(&mut self, applier: &mut A) -> SyncResult<SyncCycleResult> {
        let start = Instant::now();
        let cursor_before = applier.cursor();

        self.state = SyncState::Pulling;
        let pulled = match self.pull_all(applier, cursor_before) {
            Ok(pulled) => pulled,
            Err(e) => {
                self.handle_error(&e);
                return Err(e);
            }
        };

        let mut persisted = false;
        if pulled.after > cursor_before {
            self.state = SyncState::Persisting;
            match applier.commit(pulled.after) {
                Ok(written) => persisted = written,
                Err(e) => {
                    self.handle_error(&e);
                    return Err(e);
                }
            }
        }

        let result = SyncCycleResult {
            chunks: pulled.chunks,
            changes: pulled.changes,
            cursor_before,
            cursor_after: applier.cursor(),
            persisted,
            duration: start.elapsed(),
        };

        self.state = SyncState::Synced;
        self.stats.cycles_completed += 1;
        self.stats.chunks_applied += result.chunks;
        self.stats.record(&result.changes);
        if persisted {
            self.stats.snapshots_written += 1;
        }
        self.stats.last_sync_time = Some(Instant::now());
        self.stats.last_error = None;

        info!(
            before = %result.cursor_before,
            after = %result.cursor_after,
            chunks = result.chunks,
            persisted = result.persisted,
            "sync complete"
        );
        Ok(result)
    }

    /// Fetches the full body of a note from the server.
    pub fn fetch_content(&self, guid: &str) -> SyncResult<Vec<u8>> {
        let request = ContentRequest {
            auth_token: self.session.auth_token.clone(),
            guid: guid.to_string(),
        };
        self.gateway.get_content(&request)
    }

    fn pull_all<A: ChunkApplier>(&self, applier: &mut A, start: Usn) -> SyncResult<Pulled> {
        let mut pulled = Pulled {
            after: start,
            chunks: 0,
            changes: ChunkSummary::default(),
        };

        loop {
            let request = ChunkRequest {
                auth_token: self.session.auth_token.clone(),
                after_usn: pulled.after,
                max_entries: self.config.max_entries(),
                filter: self.config.filter,
            };
            let chunk = self.gateway.get_chunk(&request)?;

            let Some(high) = chunk.high_mark() else {
                break;
            };
            if high <= pulled.after {
                warn!(
                    after = %pulled.after,
                    high = %high,
                    "server reported no progress, stopping"
                );
                break;
            }

            let changes = applier.apply_chunk(&chunk)?;
            pulled.after = high;
            pulled.chunks += 1;
            pulled.changes.accumulate(&changes);
            debug!("synced {}/{}", high, chunk.update_count);

            if pulled.after == chunk.update_count {
                break;
            }
        }

        Ok(pulled)
    }

    fn handle_error(&mut self, error: &SyncError) {
        self.state = SyncState::Error;
        self.stats.last_error = Some(error.to_string());
    }
}
