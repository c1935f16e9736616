//! Origin-side protocol role.
//!
//! The dispatcher issues chunks with fresh challenges, verifies the proofs
//! that come back and reports every successfully-proven address on the
//! synced stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use pushsync_core::{
    Challenge, Chunk, ChunkAddress, ChunkMessage, NodeAddress, PeerId, ProofMessage, Prover,
};

use crate::config::PushSyncConfig;
use crate::error::{Result, SyncError};
use crate::worker::{lock, Workers};

/// Readable stream of confirmed-synced chunk addresses.
pub type SyncedStream = mpsc::Receiver<ChunkAddress>;

/// Snapshot of dispatcher counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Chunk messages enqueued for transmission.
    pub dispatched: u64,
    /// Proofs that verified.
    pub synced: u64,
    /// Proofs that failed verification.
    pub rejected: u64,
}

#[derive(Default)]
struct Counters {
    dispatched: AtomicU64,
    synced: AtomicU64,
    rejected: AtomicU64,
}

/// Origin-side role of push-sync.
pub struct Dispatcher<P: Prover> {
    base: NodeAddress,
    prover: Arc<P>,
    chunk_tx: Mutex<Option<mpsc::Sender<ChunkMessage>>>,
    chunk_rx: Mutex<Option<mpsc::Receiver<ChunkMessage>>>,
    synced_tx: Mutex<Option<mpsc::Sender<ChunkAddress>>>,
    synced_rx: Mutex<Option<SyncedStream>>,
    counters: Counters,
    pub(crate) workers: Workers,
}

impl<P: Prover> Dispatcher<P> {
    /// Create a dispatcher for the node at `base`.
    ///
    /// The dispatcher is inert until attached to a transport with
    /// [`Dispatcher::attach`].
    pub fn new(base: NodeAddress, prover: Arc<P>, config: &PushSyncConfig) -> Result<Self> {
        config.validate()?;

        let (chunk_tx, chunk_rx) = mpsc::channel(config.chunk_queue_capacity);
        let (synced_tx, synced_rx) = mpsc::channel(config.synced_queue_capacity);

        Ok(Self {
            base,
            prover,
            chunk_tx: Mutex::new(Some(chunk_tx)),
            chunk_rx: Mutex::new(Some(chunk_rx)),
            synced_tx: Mutex::new(Some(synced_tx)),
            synced_rx: Mutex::new(Some(synced_rx)),
            counters: Counters::default(),
            workers: Workers::new("dispatcher"),
        })
    }

    /// Overlay address chunk messages are sent from.
    pub fn base(&self) -> NodeAddress {
        self.base
    }

    /// Dispatch `chunk` with a fresh challenge.
    ///
    /// Returns once the message is queued; waits only if the queue is full.
    pub async fn send_chunk(&self, chunk: &Chunk) -> Result<()> {
        let tx = self.sender(&self.chunk_tx)?;

        let message = ChunkMessage::new(self.base, chunk, Challenge::random());
        tx.send(message).await.map_err(|_| SyncError::Closed)?;

        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        debug!(chunk = %chunk.address(), "dispatched chunk");
        Ok(())
    }

    /// Verify a returned proof sent by `sender`.
    ///
    /// A proof that fails verification is not an error: the address is
    /// simply not reported as synced. A confirmation waiting on a full
    /// synced stream is discarded if the dispatcher is closed meanwhile.
    pub async fn handle_proof(&self, message: ProofMessage, sender: PeerId) -> Result<()> {
        let tx = self.sender(&self.synced_tx)?;
        let address = message.address;

        if let Err(e) = self.prover.verify(&message.proof, &address, &sender) {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(chunk = %address, peer = %sender, error = %e, "proof of custody rejected");
            return Ok(());
        }

        self.counters.synced.fetch_add(1, Ordering::Relaxed);
        tokio::select! {
            sent = tx.send(address) => {
                if sent.is_err() {
                    debug!(chunk = %address, "synced stream dropped, confirmation discarded");
                }
            }
            _ = self.workers.closed() => {
                debug!(chunk = %address, "dispatcher closed, confirmation discarded");
            }
        }
        Ok(())
    }

    /// Take the synced stream. Can only be taken once.
    pub fn take_synced(&self) -> Result<SyncedStream> {
        if self.is_closed() {
            return Err(SyncError::Closed);
        }
        lock(&self.synced_rx).take().ok_or(SyncError::StreamTaken)
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            synced: self.counters.synced.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }

    /// Stop the drain worker and end the synced stream.
    ///
    /// Idempotent and non-blocking. A chunk being sent is finished; chunks
    /// still queued are dropped.
    pub fn close(&self) {
        if !self.workers.close() {
            return;
        }
        lock(&self.chunk_tx).take();
        lock(&self.chunk_rx).take();
        lock(&self.synced_tx).take();
        lock(&self.synced_rx).take();
        debug!(base = %self.base, "dispatcher closed");
    }

    pub fn is_closed(&self) -> bool {
        self.workers.is_closed()
    }

    /// Close and wait for the drain worker to finish.
    pub async fn shutdown(&self) {
        self.close();
        self.workers.join().await;
    }

    /// Take the outbound chunk queue, bypassing the transport.
    #[cfg(test)]
    pub(crate) fn take_outbound(&self) -> Option<mpsc::Receiver<ChunkMessage>> {
        lock(&self.chunk_rx).take()
    }

    pub(crate) fn take_chunk_queue(&self) -> Result<mpsc::Receiver<ChunkMessage>> {
        if self.is_closed() {
            return Err(SyncError::Closed);
        }
        lock(&self.chunk_rx)
            .take()
            .ok_or(SyncError::AlreadyAttached("dispatcher"))
    }

    fn sender<T>(&self, slot: &Mutex<Option<mpsc::Sender<T>>>) -> Result<mpsc::Sender<T>> {
        if self.is_closed() {
            return Err(SyncError::Closed);
        }
        lock(slot).clone().ok_or(SyncError::Closed)
    }
}

impl<P: Prover> Drop for Dispatcher<P> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::PrefixProver;
    use bytes::Bytes;
    use std::time::Duration;

    fn dispatcher(prover: Arc<PrefixProver>) -> Dispatcher<PrefixProver> {
        Dispatcher::new(
            NodeAddress::from_bytes([0xab; 32]),
            prover,
            &PushSyncConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_chunk_builds_message() {
        let d = dispatcher(Arc::new(PrefixProver::default()));
        let mut outbound = d.take_outbound().unwrap();
        let chunk = Chunk::new(vec![3u8; 64]);

        d.send_chunk(&chunk).await.unwrap();

        let message = outbound.recv().await.unwrap();
        assert_eq!(message.origin, d.base());
        assert_eq!(message.address, *chunk.address());
        assert_eq!(message.data, *chunk.data());
        assert_eq!(message.challenge.as_bytes().len(), 32);
        assert_eq!(d.stats().dispatched, 1);
    }

    #[tokio::test]
    async fn test_challenges_are_fresh() {
        let d = dispatcher(Arc::new(PrefixProver::default()));
        let mut outbound = d.take_outbound().unwrap();
        let chunk = Chunk::new(b"same chunk".to_vec());

        d.send_chunk(&chunk).await.unwrap();
        d.send_chunk(&chunk).await.unwrap();

        let first = outbound.recv().await.unwrap();
        let second = outbound.recv().await.unwrap();
        assert_ne!(first.challenge, second.challenge);
    }

    #[tokio::test]
    async fn test_valid_proof_is_synced() {
        let prover = Arc::new(PrefixProver::default());
        let d = dispatcher(prover.clone());
        let mut synced = d.take_synced().unwrap();
        let chunk = Chunk::new(vec![5u8; 100]);

        let proof = prover.get_proof(chunk.data(), &Challenge::random());
        let message = ProofMessage {
            address: *chunk.address(),
            proof,
        };
        d.handle_proof(message, PeerId::ZERO).await.unwrap();

        assert_eq!(synced.recv().await, Some(*chunk.address()));
        assert_eq!(d.stats().synced, 1);
    }

    #[tokio::test]
    async fn test_invalid_proof_is_silent() {
        let prover = Arc::new(PrefixProver::default());
        prover.set_failing(true);
        let d = dispatcher(prover);
        let mut synced = d.take_synced().unwrap();

        let message = ProofMessage {
            address: ChunkAddress::from_bytes([1; 32]),
            proof: Bytes::from_static(b"bogus"),
        };
        d.handle_proof(message, PeerId::ZERO).await.unwrap();

        let received = tokio::time::timeout(Duration::from_millis(100), synced.recv()).await;
        assert!(received.is_err(), "rejected proof must not be reported");
        assert_eq!(d.stats().rejected, 1);
        assert_eq!(d.stats().synced, 0);
    }

    #[tokio::test]
    async fn test_synced_stream_taken_once() {
        let d = dispatcher(Arc::new(PrefixProver::default()));
        assert!(d.take_synced().is_ok());
        assert!(matches!(d.take_synced(), Err(SyncError::StreamTaken)));
    }

    #[tokio::test]
    async fn test_closed_dispatcher() {
        let d = dispatcher(Arc::new(PrefixProver::default()));
        let mut synced = d.take_synced().unwrap();

        d.close();
        d.close();
        assert!(d.is_closed());

        let chunk = Chunk::new(b"late".to_vec());
        assert!(matches!(d.send_chunk(&chunk).await, Err(SyncError::Closed)));
        let message = ProofMessage {
            address: *chunk.address(),
            proof: Bytes::new(),
        };
        assert!(matches!(
            d.handle_proof(message, PeerId::ZERO).await,
            Err(SyncError::Closed)
        ));
        // Closing ends the synced stream.
        assert_eq!(synced.recv().await, None);
        assert!(matches!(d.take_synced(), Err(SyncError::Closed)));
    }

    #[tokio::test]
    async fn test_close_releases_blocked_confirmation() {
        let config = PushSyncConfig {
            synced_queue_capacity: 1,
            ..Default::default()
        };
        let d = Arc::new(
            Dispatcher::new(
                NodeAddress::ZERO,
                Arc::new(PrefixProver::default()),
                &config,
            )
            .unwrap(),
        );
        // Held but never read, so the second confirmation cannot be queued.
        let _synced = d.take_synced().unwrap();

        let proof = |n: u8| ProofMessage {
            address: ChunkAddress::from_bytes([n; 32]),
            proof: Bytes::new(),
        };
        d.handle_proof(proof(1), PeerId::ZERO).await.unwrap();

        let blocked = {
            let d = Arc::clone(&d);
            tokio::spawn(async move { d.handle_proof(proof(2), PeerId::ZERO).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished());

        d.close();
        let result = tokio::time::timeout(Duration::from_secs(2), blocked)
            .await
            .expect("close should release a blocked confirmation")
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(d.stats().synced, 2);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = PushSyncConfig {
            chunk_queue_capacity: 0,
            ..Default::default()
        };
        let result = Dispatcher::new(
            NodeAddress::ZERO,
            Arc::new(PrefixProver::default()),
            &config,
        );
        assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
    }
}
