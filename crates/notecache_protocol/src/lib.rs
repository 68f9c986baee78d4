//! # notecache protocol
//!
//! Change-log wire types and CBOR codecs for notecache.
//!
//! This crate provides:
//! - `Note`, `Notebook` and `NoteAttributes` records as the server sends them
//! - `SyncChunk` pages of the server change log and the `SyncChunkFilter`
//!   that selects what a page carries
//! - Request/reply messages for authentication, chunk and content retrieval
//! - CBOR encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod error;
mod messages;
mod types;

pub use chunk::{SyncChunk, SyncChunkFilter, MAX_SYNC_ENTRIES};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    AuthenticateRequest, ChunkRequest, ContentReply, ContentRequest, FaultKind, RemoteFault,
    Reply, Session,
};
pub use types::{Note, NoteAttributes, Notebook, Usn};

/// Encodes any protocol value to CBOR bytes.
pub fn to_cbor<T: serde::Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| ProtocolError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Decodes any protocol value from CBOR bytes.
pub fn from_cbor<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::decoding_failed(e.to_string()))
}
