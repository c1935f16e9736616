//! Strong type definitions for push-sync addressing.
//!
//! Chunk addresses, node (overlay) addresses and peer identities are all
//! 32 bytes wide, but they mean different things and must not be mixed up.
//! Each gets its own newtype; raw bytes only appear at the transport edge.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Size in bytes of every address type in this module.
pub const ADDRESS_SIZE: usize = 32;

macro_rules! address_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub [u8; ADDRESS_SIZE]);

        impl $name {
            /// The all-zero value.
            pub const ZERO: Self = Self([0u8; ADDRESS_SIZE]);

            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; ADDRESS_SIZE]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
                &self.0
            }

            /// Generate a random value.
            pub fn random() -> Self {
                use rand::Rng;
                Self(rand::thread_rng().gen())
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s)?;
                let arr: [u8; ADDRESS_SIZE] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.to_hex()[..16])
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; ADDRESS_SIZE]> for $name {
            fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = std::array::TryFromSliceError;

            fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
                let arr: [u8; ADDRESS_SIZE] = slice.try_into()?;
                Ok(Self(arr))
            }
        }
    };
}

address_type!(
    /// Content-derived address of a chunk: Blake3 of its data.
    ///
    /// Used both as the chunk store key and as the routing key for
    /// proximity delivery.
    ChunkAddress,
    "ChunkAddress"
);

address_type!(
    /// Overlay address of a node. Proof responses are sent back to the
    /// origin's overlay address with direct delivery.
    NodeAddress,
    "NodeAddress"
);

address_type!(
    /// Network-level identity of a peer, as reported by the transport for
    /// every inbound message. For [`crate::CustodyProver`] this is the
    /// peer's Ed25519 public key.
    PeerId,
    "PeerId"
);

impl ChunkAddress {
    /// Compute the content address of `data`.
    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }
}

/// Proximity order of two addresses: the number of leading bits they share.
///
/// Equal addresses have proximity `256`.
pub fn proximity(a: &[u8; ADDRESS_SIZE], b: &[u8; ADDRESS_SIZE]) -> u16 {
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = x ^ y;
        if diff != 0 {
            return (i as u16) * 8 + diff.leading_zeros() as u16;
        }
    }
    (ADDRESS_SIZE * 8) as u16
}

/// Compare the XOR distances of `a` and `b` to `target`.
///
/// Returns `Ordering::Less` when `a` is closer to `target` than `b`.
pub fn distance_cmp(
    target: &[u8; ADDRESS_SIZE],
    a: &[u8; ADDRESS_SIZE],
    b: &[u8; ADDRESS_SIZE],
) -> Ordering {
    for i in 0..ADDRESS_SIZE {
        let da = target[i] ^ a[i];
        let db = target[i] ^ b[i];
        match da.cmp(&db) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}
