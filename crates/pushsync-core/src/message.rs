//! Push-sync protocol messages.
//!
//! A [`ChunkMessage`] travels from the origin towards the chunk's
//! neighbourhood; a [`ProofMessage`] travels back to the origin. Both are
//! ephemeral: built, queued, encoded, sent and dropped.

use bytes::Bytes;

use crate::chunk::{Challenge, Chunk, MAX_CHUNK_SIZE};
use crate::error::CoreError;
use crate::types::{ChunkAddress, NodeAddress};

/// Message size limits.
pub mod limits {
    /// Max data bytes in a chunk message.
    pub const MAX_CHUNK_DATA: usize = super::MAX_CHUNK_SIZE;
    /// Max bytes in a proof.
    pub const MAX_PROOF_SIZE: usize = 1024;
}

/// A chunk dispatched for storage, carrying the challenge the custodian
/// must answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMessage {
    /// Overlay address of the dispatching node.
    pub origin: NodeAddress,
    /// Address of the chunk.
    pub address: ChunkAddress,
    /// Chunk data.
    pub data: Bytes,
    /// Fresh challenge for this dispatch.
    pub challenge: Challenge,
}

impl ChunkMessage {
    /// Wrap `chunk` for dispatch from `origin` with `challenge`.
    pub fn new(origin: NodeAddress, chunk: &Chunk, challenge: Challenge) -> Self {
        Self {
            origin,
            address: *chunk.address(),
            data: chunk.data().clone(),
            challenge,
        }
    }

    /// The carried chunk.
    pub fn chunk(&self) -> Chunk {
        Chunk::with_address(self.address, self.data.clone())
    }

    /// Check if this message respects size limits.
    pub fn validate_limits(&self) -> Result<(), CoreError> {
        if self.data.len() > limits::MAX_CHUNK_DATA {
            return Err(CoreError::LimitExceeded {
                field: "data",
                len: self.data.len(),
                max: limits::MAX_CHUNK_DATA,
            });
        }
        Ok(())
    }
}

/// A proof of custody returned to the origin of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofMessage {
    /// Address of the chunk the proof is for.
    pub address: ChunkAddress,
    /// Prover-specific proof bytes.
    pub proof: Bytes,
}

impl ProofMessage {
    /// Check if this message respects size limits.
    pub fn validate_limits(&self) -> Result<(), CoreError> {
        if self.proof.len() > limits::MAX_PROOF_SIZE {
            return Err(CoreError::LimitExceeded {
                field: "proof",
                len: self.proof.len(),
                max: limits::MAX_PROOF_SIZE,
            });
        }
        Ok(())
    }
}

/// Routing envelope pairing a proof with the node it must reach.
///
/// Never serialized; only the inner [`ProofMessage`] goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofResponse {
    /// The origin of the chunk message being answered.
    pub destination: NodeAddress,
    /// The proof to deliver.
    pub message: ProofMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_message_from_chunk() {
        let origin = NodeAddress::from_bytes([7; 32]);
        let chunk = Chunk::new(vec![1u8; 100]);
        let challenge = Challenge::from_bytes([9; 32]);

        let msg = ChunkMessage::new(origin, &chunk, challenge);
        assert_eq!(msg.origin, origin);
        assert_eq!(msg.address, *chunk.address());
        assert_eq!(msg.data, *chunk.data());
        assert_eq!(msg.chunk(), chunk);
    }

    #[test]
    fn test_chunk_message_limits() {
        let chunk = Chunk::new(vec![0u8; limits::MAX_CHUNK_DATA + 1]);
        let msg = ChunkMessage::new(NodeAddress::ZERO, &chunk, Challenge::random());
        assert!(matches!(
            msg.validate_limits(),
            Err(CoreError::LimitExceeded { field: "data", .. })
        ));

        let chunk = Chunk::new(vec![0u8; limits::MAX_CHUNK_DATA]);
        let msg = ChunkMessage::new(NodeAddress::ZERO, &chunk, Challenge::random());
        assert!(msg.validate_limits().is_ok());
    }

    #[test]
    fn test_proof_message_limits() {
        let msg = ProofMessage {
            address: ChunkAddress::ZERO,
            proof: Bytes::from(vec![0u8; limits::MAX_PROOF_SIZE + 1]),
        };
        assert!(msg.validate_limits().is_err());
    }
}
