//! Configuration for the protocol roles.

use crate::error::{Result, SyncError};

/// Queue sizes and checks shared by the dispatcher and the storer.
#[derive(Debug, Clone)]
pub struct PushSyncConfig {
    /// Capacity of the dispatcher's outbound chunk queue.
    pub chunk_queue_capacity: usize,
    /// Capacity of the storer's outbound proof-response queue.
    pub proof_queue_capacity: usize,
    /// Capacity of the dispatcher's synced-confirmation queue.
    pub synced_queue_capacity: usize,
    /// Whether the storer rejects chunks whose address is not the hash of
    /// their data.
    pub verify_chunk_address: bool,
}

impl Default for PushSyncConfig {
    fn default() -> Self {
        Self {
            chunk_queue_capacity: 128,
            proof_queue_capacity: 128,
            synced_queue_capacity: 128,
            verify_chunk_address: true,
        }
    }
}

impl PushSyncConfig {
    /// Check that every queue can hold at least one item.
    pub fn validate(&self) -> Result<()> {
        let queues = [
            ("chunk_queue_capacity", self.chunk_queue_capacity),
            ("proof_queue_capacity", self.proof_queue_capacity),
            ("synced_queue_capacity", self.synced_queue_capacity),
        ];
        for (name, capacity) in queues {
            if capacity == 0 {
                return Err(SyncError::InvalidConfig(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }
}
