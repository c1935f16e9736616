//! # Push-Sync Testkit
//!
//! Testing utilities for push-sync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Canonical encodings of known messages for cross-implementation checks
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A switchable test prover, random chunks and ready-wired test nodes
//!
//! End-to-end protocol tests live in this crate's `tests/` directory.
//!
//! ## Golden Vectors
//!
//! ```rust
//! use pushsync_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, hex) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, hex);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use pushsync_testkit::generators::chunk_message;
//!
//! proptest! {
//!     #[test]
//!     fn origin_survives_encoding(msg in chunk_message()) {
//!         let bytes = pushsync_core::encode_chunk_message(&msg).unwrap();
//!         let decoded = pushsync_core::decode_chunk_message(&bytes).unwrap();
//!         prop_assert_eq!(decoded.origin, msg.origin);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use pushsync_core::{Challenge, Prover};
//! use pushsync_testkit::fixtures::{random_chunk, PrefixProver};
//!
//! let chunk = random_chunk(100);
//! let challenge = Challenge::random();
//! let proof = PrefixProver::new().get_proof(chunk.data(), &challenge);
//! assert_eq!(&proof[..32], &chunk.data()[..32]);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    custody_prover, init_tracing, random_chunk, random_chunks, PrefixProver, TestNode,
};
pub use vectors::{all_vectors, export_vectors, verify_all_vectors, ExportedVector, WireVector};
