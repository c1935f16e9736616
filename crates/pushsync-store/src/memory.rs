//! In-memory implementation of the ChunkStore trait.
//!
//! Same semantics as SQLite, no persistence. Used by tests and by nodes
//! that only relay.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use pushsync_core::{Chunk, ChunkAddress};

use crate::error::{Result, StoreError};
use crate::traits::{ChunkStore, PutResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    chunks: RwLock<HashMap<ChunkAddress, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn put(&self, chunk: &Chunk) -> Result<PutResult> {
        let mut chunks = self.chunks.write().map_err(|_| StoreError::LockPoisoned)?;

        if chunks.contains_key(chunk.address()) {
            return Ok(PutResult::AlreadyExists);
        }
        chunks.insert(*chunk.address(), chunk.data().clone());
        Ok(PutResult::Stored)
    }

    async fn get(&self, address: &ChunkAddress) -> Result<Option<Chunk>> {
        let chunks = self.chunks.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(chunks
            .get(address)
            .map(|data| Chunk::with_address(*address, data.clone())))
    }

    async fn has(&self, address: &ChunkAddress) -> Result<bool> {
        let chunks = self.chunks.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(chunks.contains_key(address))
    }

    async fn count(&self) -> Result<usize> {
        let chunks = self.chunks.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(chunks.len())
    }
}
