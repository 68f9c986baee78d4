//! In-memory authoritative change log.
//!
//! `MemoryGateway` behaves like the real service from the cache's point of
//! view: every change gets the next sequence number, an entity appears in
//! the log only at its latest change, and chunks are served in sequence
//! order with at most `max_entries` entries each.

use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use notecache_protocol::{
    AuthenticateRequest, ChunkRequest, ContentRequest, Note, NoteAttributes, Notebook, Session,
    SyncChunk, Usn,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::trace;

/// A failure to inject into a chunk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Connection dropped.
    Transport,
    /// Token rejected.
    Auth,
    /// Remote-side failure.
    Server,
}

impl Fault {
    fn into_error(self) -> SyncError {
        match self {
            Fault::Transport => SyncError::transport_retryable("connection reset by peer"),
            Fault::Auth => SyncError::Auth("authentication token expired".into()),
            Fault::Server => SyncError::Server("internal server error".into()),
        }
    }
}

#[derive(Debug, Clone)]
enum Change {
    NotePut(Note),
    NotebookPut(Notebook),
    NoteExpunged(String),
    NotebookExpunged(String),
}

impl Change {
    fn is_note(&self, guid: &str) -> bool {
        match self {
            Change::NotePut(note) => note.guid == guid,
            Change::NoteExpunged(g) => g == guid,
            _ => false,
        }
    }

    fn is_notebook(&self, guid: &str) -> bool {
        match self {
            Change::NotebookPut(notebook) => notebook.guid == guid,
            Change::NotebookExpunged(g) => g == guid,
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct ServerLog {
    head: Usn,
    /// Live log entries in ascending sequence order.
    entries: Vec<(Usn, Change)>,
    contents: HashMap<String, Vec<u8>>,
    chunk_calls: u64,
    content_calls: u64,
    faults: HashMap<u64, Fault>,
}

impl ServerLog {
    fn record(&mut self, change: Change) -> Usn {
        self.head = self.head.next();
        self.entries.push((self.head, change));
        self.head
    }
}

/// An in-memory note service with one account.
#[derive(Debug)]
pub struct MemoryGateway {
    user_id: i64,
    token: String,
    log: Mutex<ServerLog>,
}

impl MemoryGateway {
    /// Creates an empty account reachable with `token`.
    pub fn new(user_id: i64, token: impl Into<String>) -> Self {
        Self {
            user_id,
            token: token.into(),
            log: Mutex::new(ServerLog::default()),
        }
    }

    /// Creates or updates a note and its body. Returns the assigned sequence
    /// number.
    pub fn put_note(&self, mut note: Note, content: impl Into<Vec<u8>>) -> Usn {
        let mut log = self.log.lock();
        log.entries.retain(|(_, change)| !change.is_note(&note.guid));
        log.contents.insert(note.guid.clone(), content.into());
        note.update_sequence_num = log.head.next();
        log.record(Change::NotePut(note))
    }

    /// Creates or updates a notebook. Returns the assigned sequence number.
    pub fn put_notebook(&self, mut notebook: Notebook) -> Usn {
        let mut log = self.log.lock();
        log.entries.retain(|(_, change)| !change.is_notebook(&notebook.guid));
        notebook.update_sequence_num = log.head.next();
        log.record(Change::NotebookPut(notebook))
    }

    /// Permanently deletes a note.
    pub fn expunge_note(&self, guid: &str) -> Usn {
        let mut log = self.log.lock();
        log.entries.retain(|(_, change)| !change.is_note(guid));
        log.contents.remove(guid);
        log.record(Change::NoteExpunged(guid.to_string()))
    }

    /// Permanently deletes a notebook.
    pub fn expunge_notebook(&self, guid: &str) -> Usn {
        let mut log = self.log.lock();
        log.entries.retain(|(_, change)| !change.is_notebook(guid));
        log.record(Change::NotebookExpunged(guid.to_string()))
    }

    /// The account's change-log head.
    pub fn head(&self) -> Usn {
        self.log.lock().head
    }

    /// Makes the `call`-th `get_chunk` request (1-based, counted over the
    /// gateway's lifetime) fail.
    pub fn inject_chunk_failure(&self, call: u64, fault: Fault) {
        self.log.lock().faults.insert(call, fault);
    }

    /// Number of `get_chunk` calls so far.
    pub fn chunk_calls(&self) -> u64 {
        self.log.lock().chunk_calls
    }

    /// Number of `get_content` calls so far.
    pub fn content_calls(&self) -> u64 {
        self.log.lock().content_calls
    }

    fn check_token(&self, token: &str) -> SyncResult<()> {
        if token == self.token {
            Ok(())
        } else {
            Err(SyncError::Auth("invalid authentication token".into()))
        }
    }
}

impl RemoteGateway for MemoryGateway {
    fn authenticate(&self, request: &AuthenticateRequest) -> SyncResult<Session> {
        self.check_token(&request.token)?;
        Ok(Session::new(self.user_id, request.token.clone()))
    }

    fn get_chunk(&self, request: &ChunkRequest) -> SyncResult<SyncChunk> {
        let mut log = self.log.lock();
        log.chunk_calls += 1;
        let call = log.chunk_calls;
        if let Some(fault) = log.faults.remove(&call) {
            return Err(fault.into_error());
        }
        self.check_token(&request.auth_token)?;

        let filter = request.filter;
        let mut chunk = SyncChunk::empty(log.head);
        let page = log
            .entries
            .iter()
            .filter(|(usn, _)| *usn > request.after_usn)
            .take(request.max_entries as usize);

        for (usn, change) in page {
            chunk.chunk_high_usn = Some(*usn);
            match change {
                Change::NotePut(note) if filter.include_notes => {
                    let mut note = note.clone();
                    if !filter.include_note_attributes {
                        note.attributes = NoteAttributes::default();
                    }
                    chunk.notes.push(note);
                }
                Change::NotebookPut(notebook) if filter.include_notebooks => {
                    chunk.notebooks.push(notebook.clone());
                }
                Change::NoteExpunged(guid) if filter.include_expunged => {
                    chunk.expunged_notes.push(guid.clone());
                }
                Change::NotebookExpunged(guid) if filter.include_expunged => {
                    chunk.expunged_notebooks.push(guid.clone());
                }
                _ => {}
            }
        }

        trace!(
            after = %request.after_usn,
            high = ?chunk.chunk_high_usn,
            entries = chunk.entry_count(),
            "served chunk"
        );
        Ok(chunk)
    }

    fn get_content(&self, request: &ContentRequest) -> SyncResult<Vec<u8>> {
        let mut log = self.log.lock();
        log.content_calls += 1;
        self.check_token(&request.auth_token)?;
        log.contents
            .get(&request.guid)
            .cloned()
            .ok_or_else(|| SyncError::Server(format!("note not found: {}", request.guid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notecache_protocol::SyncChunkFilter;

    fn request(after: u64, max: u32) -> ChunkRequest {
        ChunkRequest {
            auth_token: "tok".into(),
            after_usn: Usn::new(after),
            max_entries: max,
            filter: SyncChunkFilter::mirror(),
        }
    }

    fn note(guid: &str) -> Note {
        Note::new(guid, guid, "nb", Usn::ZERO)
    }

    #[test]
    fn assigns_sequence_numbers() {
        let gateway = MemoryGateway::new(1, "tok");
        assert_eq!(gateway.put_notebook(Notebook::new("nb", "Inbox", Usn::ZERO)), Usn::new(1));
        assert_eq!(gateway.put_note(note("a"), "x"), Usn::new(2));
        assert_eq!(gateway.head(), Usn::new(2));

        let chunk = gateway.get_chunk(&request(0, 10)).unwrap();
        assert_eq!(chunk.notes[0].update_sequence_num, Usn::new(2));
        assert_eq!(chunk.notebooks[0].update_sequence_num, Usn::new(1));
    }

    #[test]
    fn pages_respect_max_entries() {
        let gateway = MemoryGateway::new(1, "tok");
        for guid in ["a", "b", "c", "d", "e"] {
            gateway.put_note(note(guid), "");
        }

        let first = gateway.get_chunk(&request(0, 2)).unwrap();
        assert_eq!(first.notes.len(), 2);
        assert_eq!(first.high_mark(), Some(Usn::new(2)));
        assert_eq!(first.update_count, Usn::new(5));

        let last = gateway.get_chunk(&request(4, 2)).unwrap();
        assert_eq!(last.notes.len(), 1);
        assert_eq!(last.high_mark(), Some(Usn::new(5)));

        let past_head = gateway.get_chunk(&request(5, 2)).unwrap();
        assert_eq!(past_head.high_mark(), None);
    }

    #[test]
    fn updates_supersede_earlier_entries() {
        let gateway = MemoryGateway::new(1, "tok");
        gateway.put_note(note("a"), "v1");
        gateway.put_note(note("b"), "");
        gateway.put_note(Note::new("a", "edited", "nb", Usn::ZERO), "v2");

        let chunk = gateway.get_chunk(&request(0, 10)).unwrap();
        let guids: Vec<&str> = chunk.notes.iter().map(|n| n.guid.as_str()).collect();
        assert_eq!(guids, vec!["b", "a"]);
        assert_eq!(chunk.notes[1].title, "edited");
    }

    #[test]
    fn expunge_replaces_entity_entries() {
        let gateway = MemoryGateway::new(1, "tok");
        gateway.put_note(note("a"), "body");
        gateway.expunge_note("a");

        let chunk = gateway.get_chunk(&request(0, 10)).unwrap();
        assert!(chunk.notes.is_empty());
        assert_eq!(chunk.expunged_notes, vec!["a".to_string()]);
        assert_eq!(chunk.high_mark(), Some(Usn::new(2)));
    }

    #[test]
    fn filter_strips_attributes() {
        let gateway = MemoryGateway::new(1, "tok");
        gateway.put_note(
            note("a").with_attributes(NoteAttributes {
                source: Some("web.clip".into()),
                ..NoteAttributes::default()
            }),
            "",
        );

        let mut req = request(0, 10);
        req.filter.include_note_attributes = false;
        let chunk = gateway.get_chunk(&req).unwrap();
        assert_eq!(chunk.notes[0].attributes, NoteAttributes::default());
    }

    #[test]
    fn injected_fault_fires_once() {
        let gateway = MemoryGateway::new(1, "tok");
        gateway.put_note(note("a"), "");
        gateway.inject_chunk_failure(2, Fault::Server);

        assert!(gateway.get_chunk(&request(0, 10)).is_ok());
        assert!(matches!(
            gateway.get_chunk(&request(0, 10)),
            Err(SyncError::Server(_))
        ));
        assert!(gateway.get_chunk(&request(0, 10)).is_ok());
    }

    #[test]
    fn wrong_token_is_auth_error() {
        let gateway = MemoryGateway::new(1, "tok");
        let mut req = request(0, 10);
        req.auth_token = "nope".into();
        assert!(matches!(gateway.get_chunk(&req), Err(SyncError::Auth(_))));

        let auth = AuthenticateRequest {
            token: "nope".into(),
            host: "h".into(),
        };
        assert!(matches!(gateway.authenticate(&auth), Err(SyncError::Auth(_))));
    }

    #[test]
    fn content_is_served_and_counted() {
        let gateway = MemoryGateway::new(1, "tok");
        gateway.put_note(note("a"), "<en-note>a</en-note>");

        let req = ContentRequest {
            auth_token: "tok".into(),
            guid: "a".into(),
        };
        assert_eq!(gateway.get_content(&req).unwrap(), b"<en-note>a</en-note>");
        assert_eq!(gateway.content_calls(), 1);

        gateway.expunge_note("a");
        assert!(matches!(gateway.get_content(&req), Err(SyncError::Server(_))));
    }
}
