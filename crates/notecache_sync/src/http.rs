//! HTTP gateway implementation.
//!
//! Requests and replies are CBOR bodies POSTed to `/notecache/<call>`. The
//! actual HTTP client is abstracted via a trait so the CLI can plug in a
//! real client and tests can route requests straight into a server.

use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use crate::memory::MemoryGateway;
use notecache_protocol::{
    from_cbor, to_cbor, AuthenticateRequest, ChunkRequest, ContentReply, ContentRequest,
    RemoteFault, Reply, Session, SyncChunk,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

const AUTHENTICATE_PATH: &str = "/notecache/authenticate";
const CHUNK_PATH: &str = "/notecache/chunk";
const CONTENT_PATH: &str = "/notecache/content";

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. A returned
/// `Err` means the request never produced a reply body.
pub trait HttpClient: Send + Sync {
    /// Sends a POST request and returns the response body.
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String>;
}

/// Remote gateway speaking CBOR over HTTP.
pub struct HttpGateway<C: HttpClient> {
    /// Base URL of the service (e.g., "https://sandbox.evernote.com").
    base_url: String,
    client: C,
}

impl<C: HttpClient> HttpGateway<C> {
    /// Creates a new HTTP gateway.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_cbor<Req, Res>(&self, endpoint: &str, request: &Req) -> SyncResult<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let body = to_cbor(request)?;

        let url = format!("{}{}", self.base_url, endpoint);
        trace!(url = %url, bytes = body.len(), "posting request");
        let response_body = self
            .client
            .post(&url, body)
            .map_err(SyncError::transport_retryable)?;

        let reply: Reply<Res> = from_cbor(&response_body)?;
        reply.into_result().map_err(SyncError::from)
    }
}

impl<C: HttpClient> RemoteGateway for HttpGateway<C> {
    fn authenticate(&self, request: &AuthenticateRequest) -> SyncResult<Session> {
        self.post_cbor(AUTHENTICATE_PATH, request)
    }

    fn get_chunk(&self, request: &ChunkRequest) -> SyncResult<SyncChunk> {
        self.post_cbor(CHUNK_PATH, request)
    }

    fn get_content(&self, request: &ContentRequest) -> SyncResult<Vec<u8>> {
        let reply: ContentReply = self.post_cbor(CONTENT_PATH, request)?;
        Ok(reply.content)
    }
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a POST request and returns the response body.
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String>;
}

impl<S: LoopbackServer + ?Sized> LoopbackServer for Arc<S> {
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        (**self).handle_post(path, body)
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String> {
        let path = url.find("/notecache/").map(|i| &url[i..]).unwrap_or(url);
        self.server.handle_post(path, &body)
    }
}

impl LoopbackServer for MemoryGateway {
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        match path {
            AUTHENTICATE_PATH => {
                let request: AuthenticateRequest = decode_request(body)?;
                encode_reply(self.authenticate(&request))
            }
            CHUNK_PATH => {
                let request: ChunkRequest = decode_request(body)?;
                encode_reply(self.get_chunk(&request))
            }
            CONTENT_PATH => {
                let request: ContentRequest = decode_request(body)?;
                encode_reply(
                    self.get_content(&request)
                        .map(|content| ContentReply { content }),
                )
            }
            other => Err(format!("404 not found: {other}")),
        }
    }
}

fn decode_request<T: DeserializeOwned>(body: &[u8]) -> Result<T, String> {
    from_cbor(body).map_err(|e| format!("400 bad request: {e}"))
}

/// Faults the service reports in-band become a `Reply::Err`; anything else
/// is a failed request.
fn encode_reply<T: Serialize>(result: SyncResult<T>) -> Result<Vec<u8>, String> {
    let reply = match result {
        Ok(value) => Reply::Ok(value),
        Err(SyncError::Auth(message)) => Reply::Err(RemoteFault::auth(message)),
        Err(SyncError::Server(message)) => Reply::Err(RemoteFault::server(message)),
        Err(other) => return Err(other.to_string()),
    };
    to_cbor(&reply).map_err(|e| e.to_string())
}
