//! # Push-Sync Core
//!
//! Pure primitives for push-sync: chunk addressing, dispatch challenges,
//! protocol messages and proofs of custody.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Chunk`] - A content-addressed unit of data
//! - [`ChunkAddress`] - Blake3 content address, also the proximity routing key
//! - [`NodeAddress`] / [`PeerId`] - Overlay address and network identity of a node
//! - [`Challenge`] - Fresh 32-byte nonce issued per dispatch
//! - [`ChunkMessage`] / [`ProofMessage`] - The two wire messages
//! - [`Prover`] - Proof-of-custody capability, with [`CustodyProver`] as the
//!   Ed25519 implementation
//!
//! ## Wire Format
//!
//! Messages are encoded as deterministic CBOR. See the [`canonical`] module.

pub mod canonical;
pub mod chunk;
pub mod crypto;
pub mod error;
pub mod message;
pub mod proof;
pub mod types;

pub use canonical::{
    decode_chunk_message, decode_proof_message, encode_chunk_message, encode_proof_message,
};
pub use chunk::{Challenge, Chunk, CHALLENGE_SIZE, MAX_CHUNK_SIZE};
pub use crypto::{Ed25519Signature, Keypair};
pub use error::{CoreError, ProofError};
pub use message::{limits, ChunkMessage, ProofMessage, ProofResponse};
pub use proof::{custody_digest, CustodyProof, CustodyProver, Prover};
pub use types::{distance_cmp, proximity, ChunkAddress, NodeAddress, PeerId, ADDRESS_SIZE};
