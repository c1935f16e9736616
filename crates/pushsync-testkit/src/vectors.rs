//! Golden wire vectors.
//!
//! These vectors pin the canonical encoding of both protocol messages so
//! that any other implementation of the wire format can be checked
//! against this one byte for byte.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use pushsync_core::{
    encode_chunk_message, encode_proof_message, Challenge, ChunkAddress, ChunkMessage, CoreError,
    NodeAddress, ProofMessage,
};

/// The message a vector encodes.
#[derive(Debug, Clone)]
pub enum VectorMessage {
    Chunk(ChunkMessage),
    Proof(ProofMessage),
}

impl VectorMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            VectorMessage::Chunk(_) => "chunk",
            VectorMessage::Proof(_) => "proof",
        }
    }

    /// Canonical encoding of the message.
    pub fn encode(&self) -> Result<Vec<u8>, CoreError> {
        match self {
            VectorMessage::Chunk(msg) => encode_chunk_message(msg),
            VectorMessage::Proof(msg) => encode_proof_message(msg),
        }
    }
}

/// A golden wire vector.
#[derive(Debug, Clone)]
pub struct WireVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub message: VectorMessage,
    /// Expected canonical encoding (hex).
    pub expected_hex: &'static str,
}

/// Serializable form of a vector, for export to other implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedVector {
    pub name: String,
    pub kind: String,
    pub encoded: String,
}

/// Content addresses of known inputs (input, expected address hex).
pub const ADDRESS_VECTORS: &[(&[u8], &str)] = &[(
    b"",
    "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262",
)];

/// Get all golden wire vectors.
pub fn all_vectors() -> Vec<WireVector> {
    vec![
        WireVector {
            name: "chunk message with two data bytes",
            message: VectorMessage::Chunk(ChunkMessage {
                origin: NodeAddress::from_bytes([0xaa; 32]),
                address: ChunkAddress::from_bytes([0xbb; 32]),
                data: Bytes::from_static(b"hi"),
                challenge: Challenge::from_bytes([0xcc; 32]),
            }),
            expected_hex: concat!(
                "a4",
                "005820aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                "015820bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
                "02426869",
                "035820cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc",
            ),
        },
        WireVector {
            name: "chunk message with empty data",
            message: VectorMessage::Chunk(ChunkMessage {
                origin: NodeAddress::ZERO,
                address: ChunkAddress::ZERO,
                data: Bytes::new(),
                challenge: Challenge::from_bytes([0; 32]),
            }),
            expected_hex: concat!(
                "a4",
                "0058200000000000000000000000000000000000000000000000000000000000000000",
                "0158200000000000000000000000000000000000000000000000000000000000000000",
                "0240",
                "0358200000000000000000000000000000000000000000000000000000000000000000",
            ),
        },
        WireVector {
            name: "proof message with three proof bytes",
            message: VectorMessage::Proof(ProofMessage {
                address: ChunkAddress::from_bytes([0x11; 32]),
                proof: Bytes::from_static(&[1, 2, 3]),
            }),
            expected_hex: concat!(
                "a2",
                "0058201111111111111111111111111111111111111111111111111111111111111111",
                "0143010203",
            ),
        },
        WireVector {
            name: "proof message with empty proof",
            message: VectorMessage::Proof(ProofMessage {
                address: ChunkAddress::from_bytes([0x22; 32]),
                proof: Bytes::new(),
            }),
            expected_hex: concat!(
                "a2",
                "0058202222222222222222222222222222222222222222222222222222222222222222",
                "0140",
            ),
        },
    ]
}

/// Encode every vector and compare against its expected bytes.
///
/// Returns (name, matches, actual hex) per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let hex = v
                .message
                .encode()
                .map(hex::encode)
                .unwrap_or_else(|e| format!("error: {}", e));
            (v.name.to_string(), hex == v.expected_hex, hex)
        })
        .collect()
}

/// Vectors in their serializable form.
pub fn export_vectors() -> Vec<ExportedVector> {
    all_vectors()
        .into_iter()
        .map(|v| ExportedVector {
            name: v.name.to_string(),
            kind: v.message.kind().to_string(),
            encoded: v.expected_hex.to_string(),
        })
        .collect()
}
