//! Test prover for exercising the protocol without real custody proofs.
//!
//! Available to this crate's tests and, with the `testing` feature, to
//! other crates.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::{BufMut, Bytes, BytesMut};

use pushsync_core::{Challenge, ChunkAddress, PeerId, ProofError, Prover};

/// A prover whose proof is the first 32 bytes of data followed by the
/// challenge, and whose verification can be switched to always fail.
#[derive(Debug, Default)]
pub struct PrefixProver {
    failing: AtomicBool,
}

impl PrefixProver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A prover that rejects every proof.
    pub fn failing() -> Self {
        let prover = Self::new();
        prover.set_failing(true);
        prover
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The proof this prover issues for `data` and `challenge`.
    pub fn expected_proof(data: &[u8], challenge: &Challenge) -> Bytes {
        let prefix = &data[..data.len().min(32)];
        let mut proof = BytesMut::with_capacity(prefix.len() + 32);
        proof.put_slice(prefix);
        proof.put_slice(challenge.as_bytes());
        proof.freeze()
    }
}

impl Prover for PrefixProver {
    fn get_proof(&self, data: &[u8], challenge: &Challenge) -> Bytes {
        Self::expected_proof(data, challenge)
    }

    fn verify(
        &self,
        _proof: &[u8],
        _address: &ChunkAddress,
        _prover: &PeerId,
    ) -> Result<(), ProofError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProofError::VerificationFailed("prover set to fail".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_proof_layout() {
        let challenge = Challenge::from_bytes([0xcc; 32]);

        let proof = PrefixProver::new().get_proof(&[1u8; 100], &challenge);
        assert_eq!(&proof[..32], &[1u8; 32]);
        assert_eq!(&proof[32..], challenge.as_bytes());

        // Short data is used whole.
        let proof = PrefixProver::new().get_proof(b"abc", &challenge);
        assert_eq!(proof.len(), 3 + 32);
        assert_eq!(&proof[..3], b"abc");
    }

    #[test]
    fn test_failing_switch() {
        let prover = PrefixProver::failing();
        assert!(prover.verify(b"", &ChunkAddress::ZERO, &PeerId::ZERO).is_err());
        prover.set_failing(false);
        assert!(prover.verify(b"", &ChunkAddress::ZERO, &PeerId::ZERO).is_ok());
    }
}
