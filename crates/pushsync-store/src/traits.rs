//! ChunkStore trait: the abstract interface for chunk persistence.

use async_trait::async_trait;
use pushsync_core::{Chunk, ChunkAddress};

use crate::error::Result;

/// Result of storing a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutResult {
    /// The chunk was new and has been stored.
    Stored,
    /// A chunk with this address was already stored (idempotent - not an error).
    AlreadyExists,
}

/// Async interface for chunk persistence, keyed by [`ChunkAddress`].
///
/// Implementations must be safe for concurrent use: the storer may handle
/// many chunk messages at once.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store a chunk.
    ///
    /// # Returns
    /// - `Stored` if the chunk was new.
    /// - `AlreadyExists` if a chunk with the same address is present.
    async fn put(&self, chunk: &Chunk) -> Result<PutResult>;

    /// Get a chunk by address. `None` if not stored.
    async fn get(&self, address: &ChunkAddress) -> Result<Option<Chunk>>;

    /// Check if a chunk is stored.
    async fn has(&self, address: &ChunkAddress) -> Result<bool>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;
}
