//! Proofs of custody.
//!
//! The [`Prover`] capability is pluggable: the storer calls
//! [`Prover::get_proof`] on the data and the dispatch challenge, the
//! dispatcher calls [`Prover::verify`] on what comes back.
//!
//! [`CustodyProver`] is the Ed25519/Blake3 implementation used by nodes.
//! Its proof is laid out as:
//!
//! ```text
//! challenge (32) || custody digest (32) || signature (64)
//!
//! custody digest = Blake3_keyed(key = challenge, data)
//! signature      = Ed25519(DOMAIN || address || challenge || custody digest)
//! ```
//!
//! The signature binds the prover's identity to the chunk address and the
//! challenge, so a proof cannot be replayed under another identity or for
//! another chunk.

use bytes::{BufMut, Bytes, BytesMut};

use crate::chunk::{Challenge, CHALLENGE_SIZE};
use crate::crypto::{verify_signature, Ed25519Signature, Keypair, SIGNATURE_SIZE};
use crate::error::ProofError;
use crate::types::{ChunkAddress, PeerId, ADDRESS_SIZE};

/// Domain separator for custody signatures.
pub const CUSTODY_DOMAIN: &[u8] = b"pushsync-custody-v0:";

/// Size in bytes of a [`CustodyProof`].
pub const CUSTODY_PROOF_SIZE: usize = CHALLENGE_SIZE + 32 + SIGNATURE_SIZE;

/// Produces and verifies proofs of custody.
///
/// Implementations are stateless per call and may be used concurrently.
pub trait Prover: Send + Sync {
    /// Compute a proof that the caller holds `data`, answering `challenge`.
    fn get_proof(&self, data: &[u8], challenge: &Challenge) -> Bytes;

    /// Verify `proof` for the chunk at `address`, as claimed by `prover`.
    fn verify(&self, proof: &[u8], address: &ChunkAddress, prover: &PeerId)
        -> Result<(), ProofError>;
}

/// The keyed digest a custodian computes over chunk data.
pub fn custody_digest(data: &[u8], challenge: &Challenge) -> [u8; 32] {
    *blake3::keyed_hash(challenge.as_bytes(), data).as_bytes()
}

/// A parsed custody proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyProof {
    /// The challenge being answered.
    pub challenge: Challenge,
    /// Keyed digest of the chunk data.
    pub digest: [u8; 32],
    /// Signature over the address, challenge and digest.
    pub signature: Ed25519Signature,
}

impl CustodyProof {
    /// Parse from proof bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProofError> {
        if bytes.len() != CUSTODY_PROOF_SIZE {
            return Err(ProofError::Malformed(format!(
                "expected {} bytes, got {}",
                CUSTODY_PROOF_SIZE,
                bytes.len()
            )));
        }

        let (challenge, rest) = bytes.split_at(CHALLENGE_SIZE);
        let (digest, signature) = rest.split_at(32);

        let malformed = |_| ProofError::Malformed("bad field length".into());
        Ok(Self {
            challenge: Challenge::try_from(challenge).map_err(malformed)?,
            digest: digest.try_into().map_err(malformed)?,
            signature: Ed25519Signature(signature.try_into().map_err(malformed)?),
        })
    }

    /// Serialize to proof bytes.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(CUSTODY_PROOF_SIZE);
        buf.put_slice(self.challenge.as_bytes());
        buf.put_slice(&self.digest);
        buf.put_slice(self.signature.as_bytes());
        buf.freeze()
    }

    /// Whether the digest was computed over `data`.
    ///
    /// Only a party holding the data (e.g. the origin) can check this.
    pub fn matches_data(&self, data: &[u8]) -> bool {
        custody_digest(data, &self.challenge) == self.digest
    }
}

/// Bytes covered by a custody signature.
fn signed_message(address: &ChunkAddress, challenge: &Challenge, digest: &[u8; 32]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(CUSTODY_DOMAIN.len() + ADDRESS_SIZE + CHALLENGE_SIZE + 32);
    msg.extend_from_slice(CUSTODY_DOMAIN);
    msg.extend_from_slice(address.as_bytes());
    msg.extend_from_slice(challenge.as_bytes());
    msg.extend_from_slice(digest);
    msg
}

/// Ed25519/Blake3 prover. Signs proofs with the node's keypair.
#[derive(Debug, Clone)]
pub struct CustodyProver {
    keypair: Keypair,
}

impl CustodyProver {
    /// Create a prover signing with `keypair`.
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// The identity proofs are signed under.
    pub fn peer_id(&self) -> PeerId {
        self.keypair.peer_id()
    }
}

impl Prover for CustodyProver {
    fn get_proof(&self, data: &[u8], challenge: &Challenge) -> Bytes {
        let address = ChunkAddress::of(data);
        let digest = custody_digest(data, challenge);
        let signature = self
            .keypair
            .sign(&signed_message(&address, challenge, &digest));

        CustodyProof {
            challenge: *challenge,
            digest,
            signature,
        }
        .to_bytes()
    }

    fn verify(
        &self,
        proof: &[u8],
        address: &ChunkAddress,
        prover: &PeerId,
    ) -> Result<(), ProofError> {
        let proof = CustodyProof::parse(proof)?;
        let msg = signed_message(address, &proof.challenge, &proof.digest);
        verify_signature(prover, &msg, &proof.signature)
    }
}
