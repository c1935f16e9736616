//! The sync queue: where chunks wait until their custody is proven.
//!
//! [`SyncQueue`] is the boundary to the persistence layer that tracks
//! per-chunk sync state and decides when to re-dispatch. The syncer only
//! reports into it.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use pushsync_core::{Chunk, ChunkAddress};

use crate::error::{Result, SyncerError};

/// Tracks chunks between dispatch and proof of custody.
#[async_trait]
pub trait SyncQueue: Send + Sync {
    /// Record `chunk` as waiting to be synced.
    async fn push(&self, chunk: &Chunk) -> Result<()>;

    /// Record that custody of `address` has been proven.
    async fn synced(&self, address: &ChunkAddress) -> Result<()>;
}

#[derive(Default)]
struct QueueState {
    pending: HashMap<ChunkAddress, Chunk>,
    synced: HashSet<ChunkAddress>,
}

/// In-memory sync queue.
#[derive(Default)]
pub struct MemorySyncQueue {
    state: Mutex<QueueState>,
}

impl MemorySyncQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks pushed but not yet synced, in no particular order.
    pub fn pending(&self) -> Result<Vec<Chunk>> {
        Ok(self.state()?.pending.values().cloned().collect())
    }

    pub fn is_synced(&self, address: &ChunkAddress) -> Result<bool> {
        Ok(self.state()?.synced.contains(address))
    }

    pub fn synced_count(&self) -> Result<usize> {
        Ok(self.state()?.synced.len())
    }

    fn state(&self) -> Result<MutexGuard<'_, QueueState>> {
        self.state
            .lock()
            .map_err(|_| SyncerError::Queue("sync queue lock poisoned".into()))
    }
}

#[async_trait]
impl SyncQueue for MemorySyncQueue {
    async fn push(&self, chunk: &Chunk) -> Result<()> {
        let mut state = self.state()?;
        if !state.synced.contains(chunk.address()) {
            state.pending.insert(*chunk.address(), chunk.clone());
        }
        Ok(())
    }

    async fn synced(&self, address: &ChunkAddress) -> Result<()> {
        let mut state = self.state()?;
        state.pending.remove(address);
        state.synced.insert(*address);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_then_synced() {
        let queue = MemorySyncQueue::new();
        let chunk = Chunk::new(b"queued".to_vec());

        queue.push(&chunk).await.unwrap();
        assert_eq!(queue.pending().unwrap(), vec![chunk.clone()]);
        assert!(!queue.is_synced(chunk.address()).unwrap());

        queue.synced(chunk.address()).await.unwrap();
        assert!(queue.pending().unwrap().is_empty());
        assert!(queue.is_synced(chunk.address()).unwrap());
        assert_eq!(queue.synced_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_repeated_confirmation_counts_once() {
        let queue = MemorySyncQueue::new();
        let address = ChunkAddress::from_bytes([3; 32]);

        queue.synced(&address).await.unwrap();
        queue.synced(&address).await.unwrap();
        assert_eq!(queue.synced_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_push_after_synced_is_not_pending() {
        let queue = MemorySyncQueue::new();
        let chunk = Chunk::new(b"early proof".to_vec());

        queue.synced(chunk.address()).await.unwrap();
        queue.push(&chunk).await.unwrap();
        assert!(queue.pending().unwrap().is_empty());
    }
}
