//! Proptest generators for property-based testing.

use bytes::Bytes;
use proptest::prelude::*;

use pushsync_core::{
    limits, Challenge, Chunk, ChunkAddress, ChunkMessage, NodeAddress, ProofMessage,
    MAX_CHUNK_SIZE,
};

/// Generate a random ChunkAddress.
pub fn chunk_address() -> impl Strategy<Value = ChunkAddress> {
    any::<[u8; 32]>().prop_map(ChunkAddress::from_bytes)
}

/// Generate a random NodeAddress.
pub fn node_address() -> impl Strategy<Value = NodeAddress> {
    any::<[u8; 32]>().prop_map(NodeAddress::from_bytes)
}

pub fn challenge() -> impl Strategy<Value = Challenge> {
    any::<[u8; 32]>().prop_map(Challenge::from_bytes)
}

/// Generate chunk data of at most `max_len` bytes.
pub fn chunk_data(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a content-addressed chunk of any valid size.
pub fn chunk() -> impl Strategy<Value = Chunk> {
    chunk_data(MAX_CHUNK_SIZE).prop_map(Chunk::new)
}

/// Generate a chunk message for a content-addressed chunk.
pub fn chunk_message() -> impl Strategy<Value = ChunkMessage> {
    (node_address(), chunk(), challenge())
        .prop_map(|(origin, chunk, challenge)| ChunkMessage::new(origin, &chunk, challenge))
}

/// Generate a proof message with a proof within the size limit.
pub fn proof_message() -> impl Strategy<Value = ProofMessage> {
    (chunk_address(), chunk_data(limits::MAX_PROOF_SIZE)).prop_map(|(address, proof)| {
        ProofMessage {
            address,
            proof: Bytes::from(proof),
        }
    })
}
