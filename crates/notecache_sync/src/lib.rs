//! # notecache sync
//!
//! Incremental synchronization of a note account into a local cache.
//!
//! This crate provides:
//! - The `RemoteGateway` abstraction over the note service
//! - `SyncEngine`: paginated change-log pull with per-chunk application
//! - `NoteCache`: the facade downstream code uses (notes, notebooks,
//!   notebook names, lazily fetched content, `sync()`)
//! - Gateways: `MockGateway`, the in-memory `MemoryGateway` change log, and
//!   `HttpGateway` (CBOR over any `HttpClient`)
//!
//! ## Architecture
//!
//! A sync pulls change-log chunks strictly after the persisted cursor until
//! the server reports no further high-water mark or the account head is
//! reached. Each chunk is applied to the in-memory indices as a unit. The
//! cursor and snapshot are written once, at the end, and only if the cursor
//! advanced.
//!
//! ## Key Invariants
//!
//! - Server is authoritative; there is a single client replica
//! - The cursor never regresses and only advances together with a durable
//!   snapshot
//! - Replay is idempotent: re-running `sync()` from the persisted cursor
//!   reaches the same state
//! - Gateway and filesystem errors propagate unchanged; nothing retries
//!   internally

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod applier;
mod cache;
mod config;
mod engine;
mod error;
mod gateway;
mod http;
mod memory;

pub use applier::ChunkApplier;
pub use cache::NoteCache;
pub use config::{SyncConfig, DEFAULT_CACHE_ROOT, DEFAULT_HOST};
pub use engine::{SyncCycleResult, SyncEngine, SyncState, SyncStats};
pub use error::{SyncError, SyncResult};
pub use gateway::{MockGateway, RemoteGateway};
pub use http::{HttpClient, HttpGateway, LoopbackClient, LoopbackServer};
pub use memory::{Fault, MemoryGateway};
