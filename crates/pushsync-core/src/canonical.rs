//! Canonical CBOR encoding for protocol messages.
//!
//! Messages are CBOR maps with small integer keys, written with RFC 8949
//! core deterministic encoding:
//! - Map keys in ascending order
//! - Lengths use the smallest valid encoding
//! - Definite lengths only
//!
//! Decoding only accepts the canonical form: the decoded message is
//! re-encoded and must reproduce the input byte for byte.

use bytes::Bytes;
use ciborium::value::Value;

use crate::chunk::{Challenge, CHALLENGE_SIZE};
use crate::error::CoreError;
use crate::message::{ChunkMessage, ProofMessage};
use crate::types::{ChunkAddress, NodeAddress, ADDRESS_SIZE};

/// Field keys for [`ChunkMessage`], in wire order.
mod chunk_keys {
    pub const ORIGIN: u64 = 0;
    pub const ADDRESS: u64 = 1;
    pub const DATA: u64 = 2;
    pub const CHALLENGE: u64 = 3;
}

/// Field keys for [`ProofMessage`], in wire order.
mod proof_keys {
    pub const ADDRESS: u64 = 0;
    pub const PROOF: u64 = 1;
}

/// Encode a chunk message to canonical bytes.
///
/// Fails if the message exceeds the size limits.
pub fn encode_chunk_message(msg: &ChunkMessage) -> Result<Vec<u8>, CoreError> {
    msg.validate_limits()?;

    let mut buf = Vec::with_capacity(msg.data.len() + 3 * ADDRESS_SIZE + 16);
    encode_uint(&mut buf, 5, 4);

    encode_uint(&mut buf, 0, chunk_keys::ORIGIN);
    encode_bytes(&mut buf, msg.origin.as_bytes());

    encode_uint(&mut buf, 0, chunk_keys::ADDRESS);
    encode_bytes(&mut buf, msg.address.as_bytes());

    encode_uint(&mut buf, 0, chunk_keys::DATA);
    encode_bytes(&mut buf, &msg.data);

    encode_uint(&mut buf, 0, chunk_keys::CHALLENGE);
    encode_bytes(&mut buf, msg.challenge.as_bytes());

    Ok(buf)
}

/// Encode a proof message to canonical bytes.
pub fn encode_proof_message(msg: &ProofMessage) -> Result<Vec<u8>, CoreError> {
    msg.validate_limits()?;

    let mut buf = Vec::with_capacity(msg.proof.len() + ADDRESS_SIZE + 8);
    encode_uint(&mut buf, 5, 2);

    encode_uint(&mut buf, 0, proof_keys::ADDRESS);
    encode_bytes(&mut buf, msg.address.as_bytes());

    encode_uint(&mut buf, 0, proof_keys::PROOF);
    encode_bytes(&mut buf, &msg.proof);

    Ok(buf)
}

/// Decode a chunk message from canonical bytes.
pub fn decode_chunk_message(bytes: &[u8]) -> Result<ChunkMessage, CoreError> {
    let fields = decode_map(bytes, 4)?;

    let origin = NodeAddress(fixed_field(&fields, chunk_keys::ORIGIN, "origin")?);
    let address = ChunkAddress(fixed_field(&fields, chunk_keys::ADDRESS, "address")?);
    let data = bytes_field(&fields, chunk_keys::DATA, "data")?;
    let challenge = Challenge(fixed_field::<CHALLENGE_SIZE>(
        &fields,
        chunk_keys::CHALLENGE,
        "challenge",
    )?);

    let msg = ChunkMessage {
        origin,
        address,
        data: Bytes::copy_from_slice(data),
        challenge,
    };

    if encode_chunk_message(&msg)? != bytes {
        return Err(CoreError::NonCanonical);
    }
    Ok(msg)
}

/// Decode a proof message from canonical bytes.
pub fn decode_proof_message(bytes: &[u8]) -> Result<ProofMessage, CoreError> {
    let fields = decode_map(bytes, 2)?;

    let address = ChunkAddress(fixed_field(&fields, proof_keys::ADDRESS, "address")?);
    let proof = bytes_field(&fields, proof_keys::PROOF, "proof")?;

    let msg = ProofMessage {
        address,
        proof: Bytes::copy_from_slice(proof),
    };

    if encode_proof_message(&msg)? != bytes {
        return Err(CoreError::NonCanonical);
    }
    Ok(msg)
}

/// Parse `bytes` as a CBOR map with exactly `len` entries.
fn decode_map(bytes: &[u8], len: usize) -> Result<Vec<(Value, Value)>, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    match value {
        Value::Map(entries) if entries.len() == len => Ok(entries),
        Value::Map(entries) => Err(CoreError::MalformedMessage(format!(
            "expected {} fields, got {}",
            len,
            entries.len()
        ))),
        _ => Err(CoreError::MalformedMessage("expected map".into())),
    }
}

/// Look up a field by integer key.
fn field(entries: &[(Value, Value)], key: u64) -> Option<&Value> {
    entries
        .iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
        .map(|(_, v)| v)
}

fn bytes_field<'a>(
    entries: &'a [(Value, Value)],
    key: u64,
    name: &str,
) -> Result<&'a [u8], CoreError> {
    match field(entries, key) {
        Some(Value::Bytes(b)) => Ok(b),
        Some(_) => Err(CoreError::MalformedMessage(format!("{} is not a byte string", name))),
        None => Err(CoreError::MalformedMessage(format!("missing {}", name))),
    }
}

fn fixed_field<const N: usize>(
    entries: &[(Value, Value)],
    key: u64,
    name: &str,
) -> Result<[u8; N], CoreError> {
    let b = bytes_field(entries, key, name)?;
    b.try_into().map_err(|_| {
        CoreError::MalformedMessage(format!("invalid {} length: {}", name, b.len()))
    })
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use proptest::prelude::*;

    fn sample_chunk_message() -> ChunkMessage {
        let chunk = Chunk::new(b"hello world".to_vec());
        ChunkMessage::new(
            NodeAddress::from_bytes([0x11; 32]),
            &chunk,
            Challenge::from_bytes([0x22; 32]),
        )
    }

    #[test]
    fn test_chunk_message_layout() {
        let bytes = encode_chunk_message(&sample_chunk_message()).unwrap();

        // Map header (4 entries), key 0, bstr(32)
        assert_eq!(bytes[0], 0xa4);
        assert_eq!(bytes[1], 0x00);
        assert_eq!(&bytes[2..4], &[0x58, 0x20]);
        assert_eq!(&bytes[4..36], &[0x11; 32]);
        // key 1, bstr(32)
        assert_eq!(bytes[36], 0x01);
        assert_eq!(&bytes[37..39], &[0x58, 0x20]);
        // key 2, bstr(11) "hello world"
        assert_eq!(bytes[71], 0x02);
        assert_eq!(bytes[72], 0x4b);
        assert_eq!(&bytes[73..84], b"hello world");
        // key 3, bstr(32)
        assert_eq!(bytes[84], 0x03);
        assert_eq!(&bytes[85..87], &[0x58, 0x20]);
        assert_eq!(&bytes[87..], &[0x22; 32]);
    }

    #[test]
    fn test_encoding_deterministic() {
        let msg = sample_chunk_message();
        assert_eq!(
            encode_chunk_message(&msg).unwrap(),
            encode_chunk_message(&msg).unwrap()
        );
    }

    #[test]
    fn test_chunk_message_roundtrip() {
        let msg = sample_chunk_message();
        let decoded = decode_chunk_message(&encode_chunk_message(&msg).unwrap()).unwrap();

        assert_eq!(decoded.origin, msg.origin);
        assert_eq!(decoded.address, msg.address);
        assert_eq!(decoded.data, msg.data);
        assert_eq!(decoded.challenge, msg.challenge);
    }

    #[test]
    fn test_proof_message_roundtrip() {
        let msg = ProofMessage {
            address: ChunkAddress::from_bytes([0x33; 32]),
            proof: Bytes::from_static(b"proof bytes"),
        };
        let decoded = decode_proof_message(&encode_proof_message(&msg).unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 2, 4096);
        assert_eq!(buf, vec![0x59, 0x10, 0x00]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_chunk_message(&[0xff, 0x00, 0x01]),
            Err(CoreError::DecodingError(_))
        ));
        assert!(decode_proof_message(&[]).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_message_type() {
        let proof = encode_proof_message(&ProofMessage {
            address: ChunkAddress::ZERO,
            proof: Bytes::new(),
        })
        .unwrap();
        assert!(matches!(
            decode_chunk_message(&proof),
            Err(CoreError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_decode_rejects_short_challenge() {
        let mut bytes = encode_chunk_message(&sample_chunk_message()).unwrap();
        // Truncate the challenge to 31 bytes and fix up its length prefix.
        bytes.truncate(bytes.len() - 1);
        let len = bytes.len();
        bytes[len - 32] = 0x1f;
        assert!(matches!(
            decode_chunk_message(&bytes),
            Err(CoreError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = encode_proof_message(&ProofMessage {
            address: ChunkAddress::ZERO,
            proof: Bytes::from_static(b"p"),
        })
        .unwrap();
        bytes.push(0x00);
        assert!(matches!(
            decode_proof_message(&bytes),
            Err(CoreError::NonCanonical)
        ));
    }

    #[test]
    fn test_decode_rejects_non_minimal_length() {
        // {0: h'00..', 1: h'61'} with the proof length written in two bytes.
        let mut bytes = vec![0xa2, 0x00, 0x58, 0x20];
        bytes.extend_from_slice(&[0u8; 32]);
        bytes.extend_from_slice(&[0x01, 0x58, 0x01, 0x61]);
        assert!(decode_proof_message(&bytes).is_err());
    }

    #[test]
    fn test_encode_rejects_oversized_proof() {
        let msg = ProofMessage {
            address: ChunkAddress::ZERO,
            proof: Bytes::from(vec![0u8; crate::message::limits::MAX_PROOF_SIZE + 1]),
        };
        assert!(matches!(
            encode_proof_message(&msg),
            Err(CoreError::LimitExceeded { .. })
        ));
    }

    proptest! {
        #[test]
        fn chunk_message_roundtrips(
            origin: [u8; 32],
            challenge: [u8; 32],
            data in prop::collection::vec(any::<u8>(), 0..=crate::MAX_CHUNK_SIZE),
        ) {
            let chunk = Chunk::new(data);
            let msg = ChunkMessage::new(NodeAddress(origin), &chunk, Challenge(challenge));
            let bytes = encode_chunk_message(&msg).unwrap();
            prop_assert_eq!(decode_chunk_message(&bytes).unwrap(), msg);
        }
    }
}
