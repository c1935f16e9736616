//! Error types for the protocol engine.

use thiserror::Error;

use pushsync_core::CoreError;
use pushsync_store::StoreError;

use crate::transport::Topic;

/// Errors that can occur in the push-sync protocol engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A message could not be encoded or decoded.
    #[error("invalid message: {0}")]
    Codec(#[from] CoreError),

    /// A decoded message failed a protocol check.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// No peer with the destination address is reachable.
    #[error("peer not found: {0}")]
    PeerNotFound(String),

    /// Nobody is registered for the topic.
    #[error("no handler registered for topic {0}")]
    NoHandler(Topic),

    /// Chunk store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The component is already wired to a transport.
    #[error("{0} already attached to a transport")]
    AlreadyAttached(&'static str),

    /// The synced stream was already taken.
    #[error("synced stream already taken")]
    StreamTaken,

    /// The component has been closed.
    #[error("closed")]
    Closed,
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, SyncError>;
