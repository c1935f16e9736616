//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use rand::{Rng, RngCore};

use pushsync_core::{Chunk, CustodyProver, Keypair, NodeAddress, Prover, MAX_CHUNK_SIZE};
use pushsync_protocol::{Dispatcher, PubSub, PushSyncConfig, Result, Storer};
use pushsync_store::MemoryStore;

pub use pushsync_protocol::testing::PrefixProver;

/// Install a tracing subscriber for tests, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A chunk of `size` random bytes.
pub fn random_chunk(size: usize) -> Chunk {
    let mut data = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut data);
    Chunk::new(data)
}

/// `count` random chunks with random sizes in `1..=MAX_CHUNK_SIZE`.
pub fn random_chunks(count: usize) -> Vec<Chunk> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| random_chunk(rng.gen_range(1..=MAX_CHUNK_SIZE)))
        .collect()
}

/// A node running both protocol roles on a transport.
pub struct TestNode<P: Prover> {
    pub address: NodeAddress,
    pub prover: Arc<P>,
    pub store: Arc<MemoryStore>,
    pub dispatcher: Arc<Dispatcher<P>>,
    pub storer: Arc<Storer<MemoryStore, P>>,
}

impl<P: Prover + 'static> TestNode<P> {
    /// Build both roles with a fresh memory store and attach them to `pubsub`.
    pub async fn start(
        address: NodeAddress,
        prover: Arc<P>,
        pubsub: Arc<dyn PubSub>,
    ) -> Result<Self> {
        let config = PushSyncConfig::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Arc::new(Dispatcher::new(address, Arc::clone(&prover), &config)?);
        let storer = Arc::new(Storer::new(Arc::clone(&store), Arc::clone(&prover), &config)?);

        dispatcher.attach(Arc::clone(&pubsub)).await?;
        storer.attach(pubsub).await?;

        Ok(Self {
            address,
            prover,
            store,
            dispatcher,
            storer,
        })
    }

    /// Close both roles and wait for their workers.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
        self.storer.shutdown().await;
    }
}

/// A custody prover with a deterministic key derived from `seed`.
pub fn custody_prover(seed: u8) -> Arc<CustodyProver> {
    Arc::new(CustodyProver::new(Keypair::from_seed(&[seed; 32])))
}
