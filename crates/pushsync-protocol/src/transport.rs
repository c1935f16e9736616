//! Transport abstraction for the push-sync protocol.
//!
//! The protocol needs a pub/sub capability with two primitives:
//! [`PubSub::register`] a handler on a topic and [`PubSub::send`] a message
//! to a destination address on a topic. How the destination is interpreted
//! depends on the topic's [`Delivery`]:
//!
//! - [`Topic::Chunk`] uses proximity delivery: the message reaches whichever
//!   peer is closest to the chunk address.
//! - [`Topic::Proof`] uses direct delivery: the message reaches the node
//!   with exactly that overlay address.

use std::fmt;

use async_trait::async_trait;
use std::sync::Arc;

use pushsync_core::PeerId;

use crate::error::Result;

/// How a transport interprets the destination of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// Deliver to the peer(s) topologically nearest the destination.
    Proximity,
    /// Deliver to the node with exactly the destination address.
    Direct,
}

/// The two push-sync topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Chunk delivery, origin to custodian.
    Chunk,
    /// Proof delivery, custodian back to origin.
    Proof,
}

impl Topic {
    /// Wire name of the topic.
    pub const fn name(&self) -> &'static str {
        match self {
            Topic::Chunk => "SYNC",
            Topic::Proof => "POC",
        }
    }

    /// Delivery semantics for messages on this topic.
    pub const fn delivery(&self) -> Delivery {
        match self {
            Topic::Chunk => Delivery::Proximity,
            Topic::Proof => Delivery::Direct,
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SYNC" => Some(Topic::Chunk),
            "POC" => Some(Topic::Proof),
            _ => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives raw messages for a topic.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one inbound message sent by `sender`.
    ///
    /// Errors are reported back to the transport; they mean the message
    /// could not be processed at all, never that it was a negative outcome.
    async fn handle(&self, message: &[u8], sender: PeerId) -> Result<()>;
}

/// Pub/sub capability the protocol roles are wired to.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Subscribe `handler` to `topic`.
    async fn register(&self, topic: Topic, handler: Arc<dyn MessageHandler>);

    /// Send `message` on `topic` to `to`, interpreted per [`Topic::delivery`].
    async fn send(&self, to: &[u8], topic: Topic, message: Vec<u8>) -> Result<()>;
}

/// A loopback transport for testing.
///
/// Every handler registered for a topic receives every message sent on it;
/// the destination is ignored.
pub mod loopback {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    /// Central subscription engine: a message sent is received by all
    /// handlers registered for the topic.
    pub struct LoopbackPubSub {
        /// Identity reported to handlers as the sender.
        peer: PeerId,
        handlers: RwLock<HashMap<Topic, Vec<Arc<dyn MessageHandler>>>>,
    }

    impl LoopbackPubSub {
        /// Create a loopback reporting the zero peer as sender.
        pub fn new() -> Self {
            Self::with_peer(PeerId::ZERO)
        }

        /// Create a loopback reporting `peer` as sender.
        pub fn with_peer(peer: PeerId) -> Self {
            Self {
                peer,
                handlers: RwLock::new(HashMap::new()),
            }
        }
    }

    impl Default for LoopbackPubSub {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PubSub for LoopbackPubSub {
        async fn register(&self, topic: Topic, handler: Arc<dyn MessageHandler>) {
            self.handlers
                .write()
                .await
                .entry(topic)
                .or_default()
                .push(handler);
        }

        async fn send(&self, _to: &[u8], topic: Topic, message: Vec<u8>) -> Result<()> {
            let handlers = self
                .handlers
                .read()
                .await
                .get(&topic)
                .cloned()
                .unwrap_or_default();

            for handler in handlers {
                handler.handle(&message, self.peer).await?;
            }
            Ok(())
        }
    }
}

/// An in-memory network simulating proximity and direct delivery.
///
/// Each endpoint has an overlay address and a peer identity. Proximity
/// sends reach the endpoint registered for the topic whose address is
/// XOR-closest to the destination; direct sends reach the endpoint with
/// exactly the destination address.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    use pushsync_core::{distance_cmp, NodeAddress, ADDRESS_SIZE};

    use crate::error::SyncError;

    struct Endpoint {
        address: NodeAddress,
        peer: PeerId,
        handlers: RwLock<HashMap<Topic, Vec<Arc<dyn MessageHandler>>>>,
    }

    impl Endpoint {
        async fn handlers(&self, topic: Topic) -> Vec<Arc<dyn MessageHandler>> {
            self.handlers
                .read()
                .await
                .get(&topic)
                .cloned()
                .unwrap_or_default()
        }
    }

    /// Shared state for the memory network.
    #[derive(Default)]
    pub struct MemoryNetwork {
        endpoints: RwLock<HashMap<NodeAddress, Arc<Endpoint>>>,
    }

    impl MemoryNetwork {
        /// Create a new memory network.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Create a pub/sub endpoint attached to this network.
        ///
        /// Replaces any endpoint previously created with the same address.
        pub async fn create_pubsub(
            self: &Arc<Self>,
            address: NodeAddress,
            peer: PeerId,
        ) -> MemoryPubSub {
            let endpoint = Arc::new(Endpoint {
                address,
                peer,
                handlers: RwLock::new(HashMap::new()),
            });
            self.endpoints
                .write()
                .await
                .insert(address, Arc::clone(&endpoint));

            MemoryPubSub {
                endpoint,
                network: Arc::clone(self),
            }
        }

        /// Pick the endpoint a message on `topic` to `to` is delivered to.
        async fn route(&self, to: &[u8; ADDRESS_SIZE], topic: Topic) -> Result<Arc<Endpoint>> {
            let endpoints = self.endpoints.read().await;

            match topic.delivery() {
                Delivery::Direct => endpoints
                    .get(&NodeAddress(*to))
                    .cloned()
                    .ok_or_else(|| SyncError::PeerNotFound(NodeAddress(*to).to_string())),
                Delivery::Proximity => {
                    let mut closest: Option<&Arc<Endpoint>> = None;
                    for endpoint in endpoints.values() {
                        if !endpoint.handlers.read().await.contains_key(&topic) {
                            continue;
                        }
                        let closer = match closest {
                            Some(best) => distance_cmp(
                                to,
                                endpoint.address.as_bytes(),
                                best.address.as_bytes(),
                            )
                            .is_lt(),
                            None => true,
                        };
                        if closer {
                            closest = Some(endpoint);
                        }
                    }
                    closest.cloned().ok_or(SyncError::NoHandler(topic))
                }
            }
        }
    }

    /// A node's view of the memory network.
    pub struct MemoryPubSub {
        endpoint: Arc<Endpoint>,
        network: Arc<MemoryNetwork>,
    }

    impl MemoryPubSub {
        /// This endpoint's overlay address.
        pub fn address(&self) -> NodeAddress {
            self.endpoint.address
        }

        /// This endpoint's peer identity.
        pub fn peer(&self) -> PeerId {
            self.endpoint.peer
        }
    }

    #[async_trait]
    impl PubSub for MemoryPubSub {
        async fn register(&self, topic: Topic, handler: Arc<dyn MessageHandler>) {
            self.endpoint
                .handlers
                .write()
                .await
                .entry(topic)
                .or_default()
                .push(handler);
        }

        async fn send(&self, to: &[u8], topic: Topic, message: Vec<u8>) -> Result<()> {
            let to: [u8; ADDRESS_SIZE] = to.try_into().map_err(|_| {
                SyncError::TransportError(format!("invalid destination length: {}", to.len()))
            })?;

            let target = self.network.route(&to, topic).await?;
            let handlers = target.handlers(topic).await;
            if handlers.is_empty() {
                return Err(SyncError::NoHandler(topic));
            }

            for handler in handlers {
                handler.handle(&message, self.endpoint.peer).await?;
            }
            Ok(())
        }
    }
}
