//! Integration tests for the note cache against in-memory servers.

use notecache_core::{StoreError, SNAPSHOT_MAGIC};
use notecache_protocol::{Note, NoteAttributes, Notebook, SyncChunk, SyncChunkFilter, Usn};
use notecache_sync::{
    Fault, HttpGateway, LoopbackClient, MemoryGateway, MockGateway, NoteCache, SyncConfig,
    SyncError, SyncState,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const HOST: &str = "sandbox.evernote.com";
const TOKEN: &str = "S=s1:U=1:E=dev";

fn config(root: &Path) -> SyncConfig {
    SyncConfig::new(HOST, root)
}

fn paged(root: &Path, page_size: u32) -> SyncConfig {
    config(root).with_page_size(page_size)
}

fn note(guid: &str, title: &str, notebook: &str) -> Note {
    Note::new(guid, title, notebook, Usn::ZERO)
}

fn guids<G: notecache_sync::RemoteGateway>(cache: &NoteCache<G>) -> Vec<String> {
    cache.notes().guids().map(str::to_string).collect()
}

fn open_memory(
    root: &Path,
    server: &Arc<MemoryGateway>,
    page_size: u32,
) -> NoteCache<Arc<MemoryGateway>> {
    NoteCache::open(TOKEN, Arc::clone(server), paged(root, page_size)).unwrap()
}

/// One chunk carrying adds and expunges for both kinds.
fn mixed_chunk() -> SyncChunk {
    let mut chunk = SyncChunk::empty(Usn::new(5));
    chunk.chunk_high_usn = Some(Usn::new(5));
    chunk.notes = vec![
        Note::new("a1", "", "", Usn::new(1)),
        Note::new("a2", "c1", "", Usn::new(2)),
    ];
    chunk.notebooks = vec![
        Notebook::new("b1", "", Usn::new(3)),
        Notebook::new("b2", "d1", Usn::new(4)),
    ];
    chunk.expunged_notes = vec!["a1".into()];
    chunk.expunged_notebooks = vec!["b1".into()];
    chunk
}

#[test]
fn mixed_chunk_then_reload() {
    let root = tempdir().unwrap();
    let gateway = MockGateway::new(1);
    gateway.push_chunk(mixed_chunk());

    let mut cache = NoteCache::open(TOKEN, gateway, config(root.path())).unwrap();
    let path = cache.path().to_path_buf();
    assert_eq!(path, root.path().join(HOST).join("1"));

    let result = cache.sync().unwrap();
    assert_eq!(result.cursor_after, Usn::new(5));
    assert!(result.persisted);
    assert_eq!(result.changes.notes_upserted, 2);
    assert_eq!(result.changes.notes_expunged, 1);
    assert_eq!(cache.cursor(), Usn::new(5));
    assert_eq!(guids(&cache), vec!["a2"]);
    assert_eq!(cache.notes().get("a2").unwrap().title, "c1");
    assert_eq!(
        cache.notebook_title_map(),
        HashMap::from([("b2".to_string(), "d1".to_string())])
    );
    assert_eq!(cache.gateway().chunk_calls(), 1);

    let snapshot = fs::read(path.join("user.dat")).unwrap();
    assert!(snapshot.starts_with(&SNAPSHOT_MAGIC));
    drop(cache);

    let reloaded = NoteCache::open(TOKEN, MockGateway::new(1), config(root.path())).unwrap();
    assert_eq!(reloaded.cursor(), Usn::new(5));
    assert_eq!(guids(&reloaded), vec!["a2"]);
    assert_eq!(reloaded.notes().get("a2").unwrap().title, "c1");
    assert_eq!(reloaded.notebook_title_map().len(), 1);
}

#[test]
fn multi_page_sync_reaches_head() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(9, TOKEN));
    server.put_notebook(Notebook::new("nb1", "Inbox", Usn::ZERO));
    for i in 0..6 {
        server.put_note(note(&format!("n{i}"), &format!("Note {i}"), "nb1"), "");
    }
    assert_eq!(server.head(), Usn::new(7));

    let mut cache = open_memory(root.path(), &server, 2);
    let result = cache.sync().unwrap();

    assert_eq!(result.chunks, 4);
    assert_eq!(server.chunk_calls(), 4);
    assert_eq!(cache.cursor(), Usn::new(7));
    assert_eq!(guids(&cache), vec!["n0", "n1", "n2", "n3", "n4", "n5"]);
    assert_eq!(cache.notebooks().len(), 1);
    assert_eq!(cache.state(), SyncState::Synced);
}

#[test]
fn incremental_sync_requests_only_new_entries() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_note(note("a", "First", "nb"), "");
    server.put_note(note("b", "Second", "nb"), "");

    let mut cache = open_memory(root.path(), &server, 256);
    cache.sync().unwrap();
    assert_eq!(cache.cursor(), Usn::new(2));

    server.put_note(note("a", "First, edited", "nb"), "");
    server.put_note(note("c", "Third", "nb"), "");
    let result = cache.sync().unwrap();

    assert_eq!(result.cursor_before, Usn::new(2));
    assert_eq!(result.cursor_after, Usn::new(4));
    assert_eq!(result.changes.notes_upserted, 2);
    assert_eq!(guids(&cache), vec!["b", "a", "c"]);
    assert_eq!(cache.notes().get("a").unwrap().title, "First, edited");
}

#[test]
fn up_to_date_sync_writes_nothing() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_note(note("a", "A", "nb"), "");

    let mut cache = open_memory(root.path(), &server, 256);
    assert!(cache.sync().unwrap().persisted);

    let result = cache.sync().unwrap();
    assert!(!result.persisted);
    assert_eq!(result.chunks, 0);
    assert_eq!(cache.stats().snapshots_written, 1);
    assert_eq!(cache.stats().cycles_completed, 2);
}

#[test]
fn empty_account_leaves_no_snapshot() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));

    let mut cache = open_memory(root.path(), &server, 256);
    let result = cache.sync().unwrap();

    assert!(!result.persisted);
    assert_eq!(cache.cursor(), Usn::ZERO);
    assert!(cache.notes().is_empty());
    assert!(!cache.path().join("user.dat").exists());
    assert_eq!(server.chunk_calls(), 1);
}

#[test]
fn failure_mid_sync_keeps_persisted_cursor() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    for guid in ["a", "b", "c", "d", "e"] {
        server.put_note(note(guid, guid, "nb"), "");
    }
    server.inject_chunk_failure(2, Fault::Transport);

    let mut cache = open_memory(root.path(), &server, 2);
    let err = cache.sync().unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(cache.cursor(), Usn::ZERO);
    assert_eq!(guids(&cache), vec!["a", "b"]);
    assert_eq!(cache.state(), SyncState::Error);
    assert!(!cache.path().join("user.dat").exists());
    drop(cache);

    let mut reopened = open_memory(root.path(), &server, 2);
    assert!(reopened.notes().is_empty());
    reopened.sync().unwrap();
    assert_eq!(reopened.cursor(), Usn::new(5));
    assert_eq!(guids(&reopened), vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn replay_after_failure_matches_clean_sync() {
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_notebook(Notebook::new("nb", "Work", Usn::ZERO));
    for guid in ["a", "b", "c", "d"] {
        server.put_note(note(guid, guid, "nb"), "");
    }
    server.put_note(note("b", "b, edited", "nb"), "");
    server.expunge_note("c");
    server.inject_chunk_failure(3, Fault::Server);

    let interrupted_root = tempdir().unwrap();
    let mut interrupted = open_memory(interrupted_root.path(), &server, 2);
    assert!(matches!(interrupted.sync(), Err(SyncError::Server(_))));
    interrupted.sync().unwrap();

    let clean_root = tempdir().unwrap();
    let mut clean = open_memory(clean_root.path(), &server, 2);
    clean.sync().unwrap();

    assert_eq!(interrupted.cursor(), clean.cursor());
    assert_eq!(interrupted.notes(), clean.notes());
    assert_eq!(interrupted.notebooks(), clean.notebooks());
    assert_eq!(guids(&clean), vec!["a", "d", "b"]);
}

#[test]
fn updated_note_content_is_refetched_once() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_note(note("n1", "Draft", "nb"), "<en-note>v1</en-note>");

    let mut cache = open_memory(root.path(), &server, 256);
    cache.sync().unwrap();
    assert_eq!(cache.note_content("n1").unwrap(), b"<en-note>v1</en-note>");
    assert_eq!(cache.note_content("n1").unwrap(), b"<en-note>v1</en-note>");
    assert_eq!(server.content_calls(), 1);

    server.put_note(note("n1", "Final", "nb"), "<en-note>v2</en-note>");
    let result = cache.sync().unwrap();
    assert_eq!(result.changes.contents_invalidated, 1);
    assert!(!cache.path().join("n1").exists());

    assert_eq!(cache.note_content("n1").unwrap(), b"<en-note>v2</en-note>");
    assert_eq!(cache.note_content("n1").unwrap(), b"<en-note>v2</en-note>");
    assert_eq!(server.content_calls(), 2);
}

#[test]
fn expunged_note_content_is_removed() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_note(note("n1", "Doomed", "nb"), "<en-note/>");

    let mut cache = open_memory(root.path(), &server, 256);
    cache.sync().unwrap();
    cache.note_content("n1").unwrap();
    assert!(cache.path().join("n1").is_file());

    server.expunge_note("n1");
    cache.sync().unwrap();
    assert!(!cache.path().join("n1").exists());
    assert!(matches!(
        cache.note_content("n1"),
        Err(SyncError::UnknownNote(_))
    ));
}

#[test]
fn content_fetched_during_failed_sync_is_not_served_stale() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_note(note("a", "a", "nb"), "<en-note>v1</en-note>");
    server.put_note(note("b", "b", "nb"), "");
    server.inject_chunk_failure(2, Fault::Transport);

    let mut cache = open_memory(root.path(), &server, 1);
    assert!(cache.sync().is_err());
    assert_eq!(cache.cursor(), Usn::ZERO);
    assert_eq!(cache.note_content("a").unwrap(), b"<en-note>v1</en-note>");
    drop(cache);

    server.put_note(note("a", "a", "nb"), "<en-note>v2</en-note>");
    let mut reopened = open_memory(root.path(), &server, 1);
    assert!(!reopened.path().join("a").exists());
    reopened.sync().unwrap();
    assert_eq!(reopened.note_content("a").unwrap(), b"<en-note>v2</en-note>");
    assert_eq!(server.content_calls(), 2);
}

#[test]
fn content_fetched_during_failed_sync_is_removed_after_expunge() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_note(note("a", "a", "nb"), "<en-note>v1</en-note>");
    server.put_note(note("b", "b", "nb"), "");
    server.inject_chunk_failure(2, Fault::Transport);

    let mut cache = open_memory(root.path(), &server, 1);
    assert!(cache.sync().is_err());
    cache.note_content("a").unwrap();
    assert!(cache.path().join("a").is_file());
    drop(cache);

    server.expunge_note("a");
    let mut reopened = open_memory(root.path(), &server, 1);
    reopened.sync().unwrap();
    assert_eq!(guids(&reopened), vec!["b"]);
    assert!(!reopened.path().join("a").exists());
}

#[test]
fn content_survives_reopen() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_note(note("n1", "Kept", "nb"), "<en-note>kept</en-note>");

    let mut cache = open_memory(root.path(), &server, 256);
    cache.sync().unwrap();
    cache.note_content("n1").unwrap();
    drop(cache);

    let reopened = open_memory(root.path(), &server, 256);
    assert_eq!(reopened.note_content("n1").unwrap(), b"<en-note>kept</en-note>");
    assert_eq!(server.content_calls(), 1);
}

#[test]
fn auth_failure_during_sync_is_fatal() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_note(note("a", "A", "nb"), "");
    server.inject_chunk_failure(1, Fault::Auth);

    let mut cache = open_memory(root.path(), &server, 256);
    let err = cache.sync().unwrap_err();
    assert!(matches!(err, SyncError::Auth(_)));
    assert!(!err.is_retryable());
    assert!(cache.notes().is_empty());
}

#[test]
fn wrong_token_cannot_open() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    let result = NoteCache::open("bogus", Arc::clone(&server), config(root.path()));
    assert!(matches!(result, Err(SyncError::Auth(_))));
}

#[test]
fn second_cache_on_same_account_is_locked() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    let _first = open_memory(root.path(), &server, 256);

    let second = NoteCache::open(TOKEN, Arc::clone(&server), config(root.path()));
    assert!(matches!(
        second,
        Err(SyncError::Store(StoreError::Locked { .. }))
    ));
}

#[test]
fn corrupt_snapshot_fails_open() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    let account = root.path().join(HOST).join("1");
    fs::create_dir_all(&account).unwrap();
    fs::write(account.join("user.dat"), b"not a snapshot").unwrap();

    let result = NoteCache::open(TOKEN, Arc::clone(&server), config(root.path()));
    assert!(matches!(
        result,
        Err(SyncError::Store(StoreError::InvalidSnapshot { .. }))
    ));
}

#[test]
fn filter_without_attributes() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(1, TOKEN));
    server.put_note(
        note("a", "Clipped", "nb").with_attributes(NoteAttributes {
            source_url: Some("https://example.com".into()),
            ..NoteAttributes::default()
        }),
        "",
    );

    let filter = SyncChunkFilter {
        include_note_attributes: false,
        ..SyncChunkFilter::mirror()
    };
    let mut cache =
        NoteCache::open(TOKEN, Arc::clone(&server), config(root.path()).with_filter(filter))
            .unwrap();
    cache.sync().unwrap();
    assert_eq!(
        cache.notes().get("a").unwrap().attributes,
        NoteAttributes::default()
    );
}

#[test]
fn http_gateway_over_loopback() {
    let root = tempdir().unwrap();
    let server = Arc::new(MemoryGateway::new(4, TOKEN));
    server.put_notebook(Notebook::new("nb", "Travel", Usn::ZERO));
    server.put_note(note("n1", "Packing list", "nb"), "<en-note>socks</en-note>");
    server.put_note(note("n2", "Itinerary", "nb"), "<en-note>fly</en-note>");
    server.expunge_note("n2");

    let gateway = HttpGateway::new(
        format!("https://{HOST}"),
        LoopbackClient::new(Arc::clone(&server)),
    );
    let mut cache = NoteCache::open(TOKEN, gateway, paged(root.path(), 1)).unwrap();
    assert_eq!(cache.path(), root.path().join(HOST).join("4"));

    let result = cache.sync().unwrap();
    assert_eq!(result.cursor_after, Usn::new(4));
    assert_eq!(guids(&cache), vec!["n1"]);
    assert_eq!(
        cache.notebook_title_map().get("nb").map(String::as_str),
        Some("Travel")
    );
    assert_eq!(
        cache.note_content("n1").unwrap(),
        b"<en-note>socks</en-note>"
    );
}
