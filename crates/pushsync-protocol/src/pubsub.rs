//! Wiring between the protocol roles and a [`PubSub`] transport.
//!
//! Attaching a role registers its inbound handler and starts the one drain
//! worker that moves its outbound queue onto the transport:
//!
//! ```text
//! Dispatcher --chunk queue--> encode --> send(address, SYNC)
//!                                                  |
//! Storer.handle_chunk <-- decode <-- SYNC handler <-
//!   |
//!   --proof queue--> encode --> send(origin, POC)
//!                                         |
//! Dispatcher.handle_proof <-- decode <-- POC handler
//! ```
//!
//! Handlers hold weak references, so a transport never keeps a role alive.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tracing::{debug, warn};

use pushsync_core::{
    decode_chunk_message, decode_proof_message, encode_chunk_message, encode_proof_message,
    ChunkMessage, PeerId, ProofResponse, Prover,
};
use pushsync_store::ChunkStore;

use crate::dispatcher::Dispatcher;
use crate::error::{Result, SyncError};
use crate::storer::Storer;
use crate::transport::{MessageHandler, PubSub, Topic};

impl<P: Prover + 'static> Dispatcher<P> {
    /// Register the proof handler on `pubsub` and start sending chunks.
    ///
    /// Can only be done once.
    pub async fn attach(self: &Arc<Self>, pubsub: Arc<dyn PubSub>) -> Result<()> {
        let outbound = self.take_chunk_queue()?;

        let handler = ProofTopicHandler {
            dispatcher: Arc::downgrade(self),
        };
        pubsub.register(Topic::Proof, Arc::new(handler)).await;

        self.workers.spawn_drain(outbound, move |message: ChunkMessage| {
            let pubsub = Arc::clone(&pubsub);
            async move {
                let address = message.address;
                let bytes = match encode_chunk_message(&message) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(chunk = %address, error = %e, "dropping unencodable chunk message");
                        return;
                    }
                };
                if let Err(e) = pubsub.send(address.as_bytes(), Topic::Chunk, bytes).await {
                    warn!(chunk = %address, error = %e, "failed to send chunk");
                }
            }
        });

        debug!(base = %self.base(), "dispatcher attached");
        Ok(())
    }
}

impl<S: ChunkStore + 'static, P: Prover + 'static> Storer<S, P> {
    /// Register the chunk handler on `pubsub` and start sending proofs.
    ///
    /// Can only be done once.
    pub async fn attach(self: &Arc<Self>, pubsub: Arc<dyn PubSub>) -> Result<()> {
        let outbound = self.take_proof_queue()?;

        let handler = ChunkTopicHandler {
            storer: Arc::downgrade(self),
        };
        pubsub.register(Topic::Chunk, Arc::new(handler)).await;

        self.workers.spawn_drain(outbound, move |response: ProofResponse| {
            let pubsub = Arc::clone(&pubsub);
            async move {
                let address = response.message.address;
                let destination = response.destination;
                let bytes = match encode_proof_message(&response.message) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(chunk = %address, error = %e, "dropping unencodable proof message");
                        return;
                    }
                };
                if let Err(e) = pubsub
                    .send(destination.as_bytes(), Topic::Proof, bytes)
                    .await
                {
                    warn!(
                        chunk = %address,
                        origin = %destination,
                        error = %e,
                        "failed to send proof"
                    );
                }
            }
        });

        debug!("storer attached");
        Ok(())
    }
}

struct ProofTopicHandler<P: Prover> {
    dispatcher: Weak<Dispatcher<P>>,
}

#[async_trait]
impl<P: Prover + 'static> MessageHandler for ProofTopicHandler<P> {
    async fn handle(&self, message: &[u8], sender: PeerId) -> Result<()> {
        let dispatcher = self.dispatcher.upgrade().ok_or(SyncError::Closed)?;
        let message = decode_proof_message(message)?;
        dispatcher.handle_proof(message, sender).await
    }
}

struct ChunkTopicHandler<S: ChunkStore, P: Prover> {
    storer: Weak<Storer<S, P>>,
}

#[async_trait]
impl<S: ChunkStore + 'static, P: Prover + 'static> MessageHandler for ChunkTopicHandler<S, P> {
    async fn handle(&self, message: &[u8], sender: PeerId) -> Result<()> {
        let storer = self.storer.upgrade().ok_or(SyncError::Closed)?;
        let message = decode_chunk_message(message)?;
        match storer.handle_chunk(message, sender).await {
            // Already logged; the origin sees an unanswered dispatch.
            Err(SyncError::Store(_)) => Ok(()),
            other => other,
        }
    }
}
