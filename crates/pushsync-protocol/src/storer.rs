//! Custodian-side protocol role.
//!
//! The storer persists every chunk it receives, answers the embedded
//! challenge with a proof of custody and queues the proof for delivery
//! back to the chunk's origin.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use pushsync_core::{ChunkAddress, ChunkMessage, PeerId, ProofMessage, ProofResponse, Prover};
use pushsync_store::{ChunkStore, PutResult};

use crate::config::PushSyncConfig;
use crate::error::{Result, SyncError};
use crate::worker::{lock, Workers};

/// Snapshot of storer counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StorerStats {
    /// Chunks newly written to the store.
    pub stored: u64,
    /// Chunks that were already in the store.
    pub duplicates: u64,
    /// Proof responses queued.
    pub proofs: u64,
    /// Chunks the store failed to persist.
    pub store_failures: u64,
    /// Messages rejected before storing.
    pub rejected: u64,
}

#[derive(Default)]
struct Counters {
    stored: AtomicU64,
    duplicates: AtomicU64,
    proofs: AtomicU64,
    store_failures: AtomicU64,
    rejected: AtomicU64,
}

/// Custodian-side role of push-sync.
pub struct Storer<S: ChunkStore, P: Prover> {
    store: Arc<S>,
    prover: Arc<P>,
    verify_chunk_address: bool,
    proof_tx: Mutex<Option<mpsc::Sender<ProofResponse>>>,
    proof_rx: Mutex<Option<mpsc::Receiver<ProofResponse>>>,
    counters: Counters,
    pub(crate) workers: Workers,
}

impl<S: ChunkStore, P: Prover> Storer<S, P> {
    /// Create a storer writing to `store` and proving with `prover`.
    pub fn new(store: Arc<S>, prover: Arc<P>, config: &PushSyncConfig) -> Result<Self> {
        config.validate()?;

        let (proof_tx, proof_rx) = mpsc::channel(config.proof_queue_capacity);

        Ok(Self {
            store,
            prover,
            verify_chunk_address: config.verify_chunk_address,
            proof_tx: Mutex::new(Some(proof_tx)),
            proof_rx: Mutex::new(Some(proof_rx)),
            counters: Counters::default(),
            workers: Workers::new("storer"),
        })
    }

    /// Store the chunk carried by `message` and queue a proof for its origin.
    ///
    /// A chunk that is already stored is answered like a new one. A store
    /// failure aborts handling: the error is returned and nothing is queued.
    pub async fn handle_chunk(&self, message: ChunkMessage, sender: PeerId) -> Result<()> {
        if self.is_closed() {
            return Err(SyncError::Closed);
        }

        let address = message.address;
        if self.verify_chunk_address && ChunkAddress::of(&message.data) != address {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(chunk = %address, peer = %sender, "chunk address does not match data");
            return Err(SyncError::InvalidMessage(format!(
                "chunk {} does not match its data",
                address
            )));
        }

        match self.store.put(&message.chunk()).await {
            Ok(PutResult::Stored) => {
                self.counters.stored.fetch_add(1, Ordering::Relaxed);
            }
            Ok(PutResult::AlreadyExists) => {
                self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
                debug!(chunk = %address, origin = %message.origin, "chunk already stored");
            }
            Err(e) => {
                self.counters.store_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    chunk = %address,
                    origin = %message.origin,
                    error = %e,
                    "failed to store chunk"
                );
                return Err(SyncError::Store(e));
            }
        }

        let response = ProofResponse {
            destination: message.origin,
            message: ProofMessage {
                address,
                proof: self.prover.get_proof(&message.data, &message.challenge),
            },
        };

        let tx = lock(&self.proof_tx).clone().ok_or(SyncError::Closed)?;
        tokio::select! {
            sent = tx.send(response) => sent.map_err(|_| SyncError::Closed)?,
            _ = self.workers.closed() => return Err(SyncError::Closed),
        }

        self.counters.proofs.fetch_add(1, Ordering::Relaxed);
        debug!(chunk = %address, origin = %message.origin, "queued proof of custody");
        Ok(())
    }

    pub fn stats(&self) -> StorerStats {
        StorerStats {
            stored: self.counters.stored.load(Ordering::Relaxed),
            duplicates: self.counters.duplicates.load(Ordering::Relaxed),
            proofs: self.counters.proofs.load(Ordering::Relaxed),
            store_failures: self.counters.store_failures.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }

    /// The chunk store this storer writes to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stop the drain worker. Idempotent and non-blocking.
    pub fn close(&self) {
        if !self.workers.close() {
            return;
        }
        lock(&self.proof_tx).take();
        lock(&self.proof_rx).take();
        debug!("storer closed");
    }

    pub fn is_closed(&self) -> bool {
        self.workers.is_closed()
    }

    /// Close and wait for the drain worker to finish.
    pub async fn shutdown(&self) {
        self.close();
        self.workers.join().await;
    }

    /// Take the outbound proof queue, bypassing the transport.
    #[cfg(test)]
    pub(crate) fn take_outbound(&self) -> Option<mpsc::Receiver<ProofResponse>> {
        lock(&self.proof_rx).take()
    }

    pub(crate) fn take_proof_queue(&self) -> Result<mpsc::Receiver<ProofResponse>> {
        if self.is_closed() {
            return Err(SyncError::Closed);
        }
        lock(&self.proof_rx)
            .take()
            .ok_or(SyncError::AlreadyAttached("storer"))
    }
}

impl<S: ChunkStore, P: Prover> Drop for Storer<S, P> {
    fn drop(&mut self) {
        self.close();
    }
}
