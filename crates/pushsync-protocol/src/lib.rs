//! # Push-Sync Protocol
//!
//! The protocol engine: the two peer roles and their wiring to a pub/sub
//! transport.
//!
//! ## Roles
//!
//! - [`Dispatcher`] runs at the origin. It sends chunks with fresh
//!   challenges, verifies returned proofs and reports synced addresses.
//! - [`Storer`] runs at the custodian. It stores chunks and answers each
//!   challenge with a proof of custody addressed to the origin.
//!
//! ## Transport
//!
//! Roles talk only through a [`PubSub`] on two topics: [`Topic::Chunk`]
//! (proximity delivery to the chunk address) and [`Topic::Proof`] (direct
//! delivery to the origin). [`loopback::LoopbackPubSub`] and
//! [`memory::MemoryNetwork`] are in-process transports for tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pushsync_core::{Chunk, CustodyProver, Keypair, NodeAddress};
//! use pushsync_protocol::{loopback::LoopbackPubSub, Dispatcher, PushSyncConfig, Storer};
//! use pushsync_store::MemoryStore;
//!
//! async fn example() -> pushsync_protocol::Result<()> {
//!     let config = PushSyncConfig::default();
//!     let prover = Arc::new(CustodyProver::new(Keypair::generate()));
//!     let pubsub = Arc::new(LoopbackPubSub::with_peer(prover.peer_id()));
//!
//!     let dispatcher = Arc::new(Dispatcher::new(NodeAddress::random(), prover.clone(), &config)?);
//!     let storer = Arc::new(Storer::new(Arc::new(MemoryStore::new()), prover, &config)?);
//!     dispatcher.attach(pubsub.clone()).await?;
//!     storer.attach(pubsub).await?;
//!
//!     let mut synced = dispatcher.take_synced()?;
//!     dispatcher.send_chunk(&Chunk::new(b"hello".to_vec())).await?;
//!     let _address = synced.recv().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod storer;
pub mod transport;

mod pubsub;
mod worker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::PushSyncConfig;
pub use dispatcher::{Dispatcher, DispatcherStats, SyncedStream};
pub use error::{Result, SyncError};
pub use storer::{Storer, StorerStats};
pub use transport::{loopback, memory, Delivery, MessageHandler, PubSub, Topic};
