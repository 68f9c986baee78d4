//! Remote gateway abstraction.

use crate::error::{SyncError, SyncResult};
use notecache_protocol::{
    AuthenticateRequest, ChunkRequest, ContentRequest, Session, SyncChunk,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The note service's authenticated change-log and content API.
///
/// Implementations own their timeout and retry policy; the cache never
/// retries a failed call.
pub trait RemoteGateway: Send + Sync {
    /// Exchanges a token for a session.
    fn authenticate(&self, request: &AuthenticateRequest) -> SyncResult<Session>;

    /// Returns the change-log page after `request.after_usn`.
    fn get_chunk(&self, request: &ChunkRequest) -> SyncResult<SyncChunk>;

    /// Returns the full body of a note.
    fn get_content(&self, request: &ContentRequest) -> SyncResult<Vec<u8>>;
}

impl<G: RemoteGateway + ?Sized> RemoteGateway for Arc<G> {
    fn authenticate(&self, request: &AuthenticateRequest) -> SyncResult<Session> {
        (**self).authenticate(request)
    }

    fn get_chunk(&self, request: &ChunkRequest) -> SyncResult<SyncChunk> {
        (**self).get_chunk(request)
    }

    fn get_content(&self, request: &ContentRequest) -> SyncResult<Vec<u8>> {
        (**self).get_content(request)
    }
}

/// A scripted gateway for testing.
///
/// Chunk replies are served from a queue; once it is empty every request
/// gets an empty chunk (no high-water mark), which ends a sync.
#[derive(Debug)]
pub struct MockGateway {
    user_id: i64,
    auth_failure: Mutex<Option<String>>,
    chunks: Mutex<VecDeque<SyncResult<SyncChunk>>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    content_failure: Mutex<Option<SyncError>>,
    chunk_requests: Mutex<Vec<ChunkRequest>>,
    chunk_calls: AtomicU64,
    content_calls: AtomicU64,
}

impl MockGateway {
    /// Creates a mock for the given account.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            auth_failure: Mutex::new(None),
            chunks: Mutex::new(VecDeque::new()),
            contents: Mutex::new(HashMap::new()),
            content_failure: Mutex::new(None),
            chunk_requests: Mutex::new(Vec::new()),
            chunk_calls: AtomicU64::new(0),
            content_calls: AtomicU64::new(0),
        }
    }

    /// Makes `authenticate` fail with an auth error.
    pub fn reject_token(&self, message: impl Into<String>) {
        *self.auth_failure.lock() = Some(message.into());
    }

    /// Queues a chunk reply.
    pub fn push_chunk(&self, chunk: SyncChunk) {
        self.chunks.lock().push_back(Ok(chunk));
    }

    /// Queues a failing chunk reply.
    pub fn push_chunk_error(&self, error: SyncError) {
        self.chunks.lock().push_back(Err(error));
    }

    /// Sets the body served for a note.
    pub fn set_content(&self, guid: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.contents.lock().insert(guid.into(), content.into());
    }

    /// Makes the next `get_content` call fail.
    pub fn fail_next_content(&self, error: SyncError) {
        *self.content_failure.lock() = Some(error);
    }

    /// Number of `get_chunk` calls so far.
    pub fn chunk_calls(&self) -> u64 {
        self.chunk_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_content` calls so far.
    pub fn content_calls(&self) -> u64 {
        self.content_calls.load(Ordering::SeqCst)
    }

    /// All chunk requests received so far.
    pub fn chunk_requests(&self) -> Vec<ChunkRequest> {
        self.chunk_requests.lock().clone()
    }
}

impl RemoteGateway for MockGateway {
    fn authenticate(&self, request: &AuthenticateRequest) -> SyncResult<Session> {
        if let Some(message) = self.auth_failure.lock().clone() {
            return Err(SyncError::Auth(message));
        }
        Ok(Session::new(self.user_id, request.token.clone()))
    }

    fn get_chunk(&self, request: &ChunkRequest) -> SyncResult<SyncChunk> {
        self.chunk_calls.fetch_add(1, Ordering::SeqCst);
        self.chunk_requests.lock().push(request.clone());
        self.chunks
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(SyncChunk::empty(request.after_usn)))
    }

    fn get_content(&self, request: &ContentRequest) -> SyncResult<Vec<u8>> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.content_failure.lock().take() {
            return Err(error);
        }
        self.contents
            .lock()
            .get(&request.guid)
            .cloned()
            .ok_or_else(|| SyncError::Server(format!("note not found: {}", request.guid)))
    }
}
