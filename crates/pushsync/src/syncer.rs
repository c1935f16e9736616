//! The Syncer: composition root for push-sync on a single node.
//!
//! Binds a chunk store, a dispatcher, a storer and a sync queue to one
//! transport. Local puts are stored, queued and dispatched; proofs that
//! come back are reported to the queue.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use pushsync_core::{Chunk, NodeAddress, Prover};
use pushsync_protocol::{Dispatcher, PubSub, PushSyncConfig, Storer};
use pushsync_store::{ChunkStore, PutResult};

use crate::error::Result;
use crate::queue::SyncQueue;

/// Configuration for the Syncer.
#[derive(Debug, Clone, Default)]
pub struct SyncerConfig {
    /// Protocol configuration shared by the dispatcher and the storer.
    pub protocol: PushSyncConfig,
}

/// A node's push-sync service.
pub struct Syncer<S: ChunkStore, P: Prover, Q: SyncQueue> {
    store: Arc<S>,
    queue: Arc<Q>,
    dispatcher: Arc<Dispatcher<P>>,
    storer: Arc<Storer<S, P>>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl<S, P, Q> Syncer<S, P, Q>
where
    S: ChunkStore + 'static,
    P: Prover + 'static,
    Q: SyncQueue + 'static,
{
    /// Build a syncer for the node at `base` and attach it to `pubsub`.
    ///
    /// The node both dispatches its own chunks and stores chunks sent to
    /// it, using `store` for both.
    pub async fn new(
        config: SyncerConfig,
        base: NodeAddress,
        store: Arc<S>,
        prover: Arc<P>,
        pubsub: Arc<dyn PubSub>,
        queue: Arc<Q>,
    ) -> Result<Self> {
        let dispatcher = Arc::new(Dispatcher::new(base, Arc::clone(&prover), &config.protocol)?);
        let storer = Arc::new(Storer::new(Arc::clone(&store), prover, &config.protocol)?);

        dispatcher.attach(Arc::clone(&pubsub)).await?;
        storer.attach(pubsub).await?;

        let mut synced = dispatcher.take_synced()?;
        let forward_to = Arc::clone(&queue);
        let forwarder = tokio::spawn(async move {
            while let Some(address) = synced.recv().await {
                if let Err(e) = forward_to.synced(&address).await {
                    warn!(chunk = %address, error = %e, "failed to record synced chunk");
                }
            }
            debug!("synced forwarder stopped");
        });

        Ok(Self {
            store,
            queue,
            dispatcher,
            storer,
            forwarder: Mutex::new(Some(forwarder)),
        })
    }

    /// Store `chunk` locally and start syncing it.
    ///
    /// A chunk that is already stored is assumed to be synced or on its
    /// way, and is neither queued nor dispatched again.
    pub async fn put(&self, chunk: &Chunk) -> Result<PutResult> {
        if self.store.put(chunk).await? == PutResult::AlreadyExists {
            debug!(chunk = %chunk.address(), "chunk already stored, not dispatching");
            return Ok(PutResult::AlreadyExists);
        }

        self.queue.push(chunk).await?;
        self.dispatcher.send_chunk(chunk).await?;
        Ok(PutResult::Stored)
    }

    /// Dispatch `chunk` again with a fresh challenge.
    pub async fn resend(&self, chunk: &Chunk) -> Result<()> {
        self.dispatcher.send_chunk(chunk).await?;
        Ok(())
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<P>> {
        &self.dispatcher
    }

    pub fn storer(&self) -> &Arc<Storer<S, P>> {
        &self.storer
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn queue(&self) -> &Arc<Q> {
        &self.queue
    }

    /// Stop dispatching and storing. Idempotent.
    ///
    /// Confirmations already on the synced stream are still forwarded.
    pub fn close(&self) {
        self.dispatcher.close();
        self.storer.close();
    }

    /// Close and wait for every worker to finish.
    pub async fn shutdown(&self) {
        self.close();
        self.dispatcher.shutdown().await;
        self.storer.shutdown().await;

        let forwarder = self
            .forwarder
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(forwarder) = forwarder {
            if let Err(e) = forwarder.await {
                debug!(error = %e, "synced forwarder did not finish cleanly");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemorySyncQueue;
    use pushsync_core::{ChunkAddress, CustodyProver, Keypair};
    use pushsync_protocol::loopback::LoopbackPubSub;
    use pushsync_store::MemoryStore;
    use std::time::Duration;

    type TestSyncer = Syncer<MemoryStore, CustodyProver, MemorySyncQueue>;

    async fn syncer() -> TestSyncer {
        let prover = Arc::new(CustodyProver::new(Keypair::generate()));
        let pubsub = Arc::new(LoopbackPubSub::with_peer(prover.peer_id()));
        Syncer::new(
            SyncerConfig::default(),
            NodeAddress::random(),
            Arc::new(MemoryStore::new()),
            prover,
            pubsub,
            Arc::new(MemorySyncQueue::new()),
        )
        .await
        .unwrap()
    }

    async fn wait_synced(queue: &MemorySyncQueue, address: &ChunkAddress) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !queue.is_synced(address).unwrap() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("chunk should be synced");
    }

    #[tokio::test]
    async fn test_put_syncs_chunk() {
        let syncer = syncer().await;
        let chunk = Chunk::new(b"syncer payload".to_vec());

        assert_eq!(syncer.put(&chunk).await.unwrap(), PutResult::Stored);
        wait_synced(syncer.queue(), chunk.address()).await;

        assert!(syncer.queue().pending().unwrap().is_empty());
        // The local storer answered from the shared store.
        assert_eq!(syncer.storer().stats().duplicates, 1);
        syncer.shutdown().await;
    }

    #[tokio::test]
    async fn test_put_existing_chunk_is_not_dispatched() {
        let syncer = syncer().await;
        let chunk = Chunk::new(b"already here".to_vec());
        syncer.store().put(&chunk).await.unwrap();

        assert_eq!(syncer.put(&chunk).await.unwrap(), PutResult::AlreadyExists);
        assert_eq!(syncer.dispatcher().stats().dispatched, 0);
        assert!(syncer.queue().pending().unwrap().is_empty());
        syncer.shutdown().await;
    }

    #[tokio::test]
    async fn test_resend_uses_fresh_dispatch() {
        let syncer = syncer().await;
        let chunk = Chunk::new(b"retry me".to_vec());

        syncer.put(&chunk).await.unwrap();
        syncer.resend(&chunk).await.unwrap();
        wait_synced(syncer.queue(), chunk.address()).await;

        assert_eq!(syncer.dispatcher().stats().dispatched, 2);
        syncer.shutdown().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let syncer = syncer().await;
        syncer.close();
        syncer.close();

        let chunk = Chunk::new(b"after close".to_vec());
        assert!(syncer.put(&chunk).await.is_err());
        syncer.shutdown().await;
    }
}
