//! # Push-Sync
//!
//! Push synchronization for a content-addressed storage network: chunks
//! injected at an origin node are pushed to the node responsible for
//! storing them, and the origin collects a proof of custody before it
//! considers the chunk synced.
//!
//! ## Overview
//!
//! - **Dispatcher**: sends each chunk towards its address with a fresh
//!   challenge and verifies the proof that comes back
//! - **Storer**: stores chunks it receives and answers the challenge
//! - **Transport**: a pub/sub with proximity delivery for chunks and direct
//!   delivery for proofs
//! - **Syncer**: wires both roles, a chunk store and a sync queue together
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pushsync::{MemorySyncQueue, Syncer, SyncerConfig};
//! use pushsync::core::{Chunk, CustodyProver, Keypair, NodeAddress};
//! use pushsync::protocol::loopback::LoopbackPubSub;
//! use pushsync::store::SqliteStore;
//!
//! async fn example() -> pushsync::Result<()> {
//!     let prover = Arc::new(CustodyProver::new(Keypair::generate()));
//!     let pubsub = Arc::new(LoopbackPubSub::with_peer(prover.peer_id()));
//!     let store = Arc::new(SqliteStore::open("chunks.db")?);
//!     let queue = Arc::new(MemorySyncQueue::new());
//!
//!     let syncer = Syncer::new(
//!         SyncerConfig::default(),
//!         NodeAddress::random(),
//!         store,
//!         prover,
//!         pubsub,
//!         queue,
//!     )
//!     .await?;
//!
//!     syncer.put(&Chunk::new(b"hello".to_vec())).await?;
//!     syncer.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `pushsync::core` - Chunks, addresses, messages and provers
//! - `pushsync::store` - Chunk store abstraction and SQLite
//! - `pushsync::protocol` - Dispatcher, storer and transports

pub mod error;
pub mod queue;
pub mod syncer;

pub use pushsync_core as core;
pub use pushsync_protocol as protocol;
pub use pushsync_store as store;

pub use error::{Result, SyncerError};
pub use queue::{MemorySyncQueue, SyncQueue};
pub use syncer::{Syncer, SyncerConfig};

pub use pushsync_core::{Challenge, Chunk, ChunkAddress, NodeAddress, PeerId, Prover};
pub use pushsync_protocol::{Dispatcher, PubSub, PushSyncConfig, Storer, Topic};
pub use pushsync_store::{ChunkStore, PutResult};
