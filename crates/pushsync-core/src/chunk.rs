//! Chunks and dispatch challenges.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ChunkAddress;

/// Maximum number of data bytes carried by a single chunk.
pub const MAX_CHUNK_SIZE: usize = 4096;

/// Size in bytes of a dispatch challenge.
pub const CHALLENGE_SIZE: usize = 32;

/// A content-addressed unit of data.
///
/// Immutable once built. `data` is reference-counted, so cloning a chunk
/// to hand it to the protocol layer does not copy the payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    address: ChunkAddress,
    data: Bytes,
}

impl Chunk {
    /// Build a chunk, deriving its address from the content.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            address: ChunkAddress::of(&data),
            data,
        }
    }

    /// Build a chunk with a precomputed address (e.g. loaded from storage).
    pub fn with_address(address: ChunkAddress, data: impl Into<Bytes>) -> Self {
        Self {
            address,
            data: data.into(),
        }
    }

    /// The chunk's address.
    pub fn address(&self) -> &ChunkAddress {
        &self.address
    }

    /// The chunk's data.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Whether the address is the content hash of the data.
    pub fn is_content_addressed(&self) -> bool {
        ChunkAddress::of(&self.data) == self.address
    }

    /// Consume the chunk and return its parts.
    pub fn into_parts(self) -> (ChunkAddress, Bytes) {
        (self.address, self.data)
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("address", &self.address)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A 32-byte nonce issued with every dispatch.
///
/// Drawn fresh for each `send_chunk`. Whether a proof computed for an
/// earlier dispatch is refused depends on the [`Prover`](crate::Prover): the
/// dispatcher does not remember the challenges it issued.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Challenge(pub [u8; CHALLENGE_SIZE]);

impl Challenge {
    /// Draw a fresh challenge from the thread-local CSPRNG.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; CHALLENGE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; CHALLENGE_SIZE] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Challenge({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Challenge {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Challenge {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; CHALLENGE_SIZE] = slice.try_into()?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_new_derives_address() {
        let chunk = Chunk::new(b"some data".to_vec());
        assert_eq!(*chunk.address(), ChunkAddress::of(b"some data"));
        assert!(chunk.is_content_addressed());
    }

    #[test]
    fn test_chunk_with_foreign_address() {
        let chunk = Chunk::with_address(ChunkAddress::from_bytes([1; 32]), b"x".to_vec());
        assert!(!chunk.is_content_addressed());
    }

    #[test]
    fn test_challenges_are_fresh() {
        let a = Challenge::random();
        let b = Challenge::random();
        assert_ne!(a, b);
        assert_eq!(a.as_bytes().len(), CHALLENGE_SIZE);
    }
}
