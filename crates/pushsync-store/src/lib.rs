//! # Push-Sync Store
//!
//! Chunk storage behind the [`ChunkStore`] trait, keyed by content address.
//!
//! ## Key Types
//!
//! - [`ChunkStore`] - The async trait the storer persists chunks through
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests and ephemeral nodes
//! - [`PutResult`] - Outcome of storing a chunk
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pushsync_core::Chunk;
//! use pushsync_store::{ChunkStore, PutResult, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("chunks.db").unwrap();
//!
//!     let chunk = Chunk::new(b"hello".to_vec());
//!     assert_eq!(store.put(&chunk).await.unwrap(), PutResult::Stored);
//!     assert_eq!(store.put(&chunk).await.unwrap(), PutResult::AlreadyExists);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent puts**: storing the same address twice returns `AlreadyExists`, not an error
//! - **Concurrent use**: every implementation is safe to share between storer invocations

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ChunkStore, PutResult};
