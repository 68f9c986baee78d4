//! Protocol messages for the remote gateway.

use crate::chunk::SyncChunkFilter;
use crate::types::Usn;
use serde::{Deserialize, Serialize};

/// Authentication request carrying a developer or OAuth token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    /// Authentication token.
    pub token: String,
    /// Service host the token was issued for.
    pub host: String,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Numeric account identifier.
    pub user_id: i64,
    /// Token to present on every subsequent call.
    pub auth_token: String,
}

impl Session {
    /// Creates a session.
    pub fn new(user_id: i64, auth_token: impl Into<String>) -> Self {
        Self {
            user_id,
            auth_token: auth_token.into(),
        }
    }
}

/// Request for one change-log page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRequest {
    /// Session token.
    pub auth_token: String,
    /// Return entries strictly after this sequence number.
    pub after_usn: Usn,
    /// Maximum number of entries in the page.
    pub max_entries: u32,
    /// What the page should carry.
    pub filter: SyncChunkFilter,
}

/// Request for a note body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    /// Session token.
    pub auth_token: String,
    /// Note GUID.
    pub guid: String,
}

/// A note body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentReply {
    /// Raw content bytes.
    #[serde(with = "cbor_bytes")]
    pub content: Vec<u8>,
}

/// Kind of fault reported by the server inside a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Bad or expired token.
    Auth,
    /// Remote-side failure.
    Server,
}

/// A fault reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFault {
    /// Fault kind.
    pub kind: FaultKind,
    /// Server-provided message.
    pub message: String,
}

impl RemoteFault {
    /// Creates an authentication fault.
    pub fn auth(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Auth,
            message: message.into(),
        }
    }

    /// Creates a server fault.
    pub fn server(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Server,
            message: message.into(),
        }
    }
}

/// Reply envelope: either the payload or a server fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply<T> {
    /// Successful reply.
    Ok(T),
    /// Server-reported fault.
    Err(RemoteFault),
}

impl<T> Reply<T> {
    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<T, RemoteFault> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Err(fault) => Err(fault),
        }
    }
}

impl<T> From<Result<T, RemoteFault>> for Reply<T> {
    fn from(result: Result<T, RemoteFault>) -> Self {
        match result {
            Ok(value) => Reply::Ok(value),
            Err(fault) => Reply::Err(fault),
        }
    }
}

/// Serializes `Vec<u8>` as a CBOR byte string rather than an integer array.
mod cbor_bytes {
    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        deserializer.deserialize_byte_buf(BytesVisitor)
    }

    struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte string")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Ok(v.to_vec())
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(byte) = seq.next_element::<u8>()? {
                out.push(byte);
            }
            Ok(out)
        }
    }
}
