//! Error types for push-sync core.

use thiserror::Error;

/// Errors raised while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("{field} exceeds limit: {len} > {max}")]
    LimitExceeded {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("non-canonical encoding")]
    NonCanonical,
}

/// Reasons a proof of custody fails verification.
///
/// The dispatcher treats every variant the same way (the address is not
/// confirmed); the distinction only feeds diagnostics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("malformed proof: {0}")]
    Malformed(String),

    #[error("prover identity is not a valid public key")]
    InvalidProver,

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("verification failed: {0}")]
    VerificationFailed(String),
}
