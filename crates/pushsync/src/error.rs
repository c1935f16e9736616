//! Error types for the Syncer.

use pushsync_protocol::SyncError;
use pushsync_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Syncer operations.
#[derive(Debug, Error)]
pub enum SyncerError {
    /// Protocol error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The sync queue rejected an update.
    #[error("sync queue error: {0}")]
    Queue(String),
}

/// Result type for Syncer operations.
pub type Result<T> = std::result::Result<T, SyncerError>;
