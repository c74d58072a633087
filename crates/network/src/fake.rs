//! An in-memory [`GossipTransport`] wiring a small set of peers directly to one another's
//! handlers, for use in tests that exercise block-sync or the transaction pool without a
//! real network.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tn_types::PublicKey;
use tokio::sync::mpsc;
use tracing::trace;

use crate::{error::TransportError, messages::GossipMessage, transport::GossipTransport};

/// Which of a peer's two topic handlers a given message belongs on, mirroring the
/// separate `register_sync_handler`/`register_transaction_handler` split on the trait.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Topic {
    Sync,
    Transaction,
}

fn topic_of(message: &GossipMessage) -> Topic {
    match message {
        GossipMessage::ForwardedTransactions(_) => Topic::Transaction,
        GossipMessage::BlockAvailabilityRequest(_)
        | GossipMessage::BlockAvailabilityResponse(_)
        | GossipMessage::BlockSyncRequest(_)
        | GossipMessage::BlockSyncResponse(_) => Topic::Sync,
    }
}

#[derive(Default)]
struct Peer {
    sync_inbound: Option<mpsc::Sender<GossipMessage>>,
    transaction_inbound: Option<mpsc::Sender<GossipMessage>>,
}

/// A shared switchboard: each [`InMemoryTransport`] handle is one node's view of it.
#[derive(Default)]
struct Switchboard {
    peers: Mutex<BTreeMap<PublicKey, Peer>>,
}

/// One node's handle onto an [`InMemoryTransport`] network. Clone to share the same
/// switchboard between a test's simulated nodes.
#[derive(Clone)]
pub struct InMemoryTransport {
    self_key: PublicKey,
    switchboard: std::sync::Arc<Switchboard>,
    sync_handler: std::sync::Arc<Mutex<Option<mpsc::Sender<GossipMessage>>>>,
    transaction_handler: std::sync::Arc<Mutex<Option<mpsc::Sender<GossipMessage>>>>,
}

impl InMemoryTransport {
    /// Creates a fresh, empty switchboard rooted at `self_key`.
    pub fn new(self_key: PublicKey) -> Self {
        Self {
            self_key,
            switchboard: std::sync::Arc::new(Switchboard::default()),
            sync_handler: std::sync::Arc::new(Mutex::new(None)),
            transaction_handler: std::sync::Arc::new(Mutex::new(None)),
        }
    }

    /// Joins the same switchboard as `other`, under a different identity.
    pub fn join(other: &InMemoryTransport, self_key: PublicKey) -> Self {
        Self {
            self_key,
            switchboard: other.switchboard.clone(),
            sync_handler: std::sync::Arc::new(Mutex::new(None)),
            transaction_handler: std::sync::Arc::new(Mutex::new(None)),
        }
    }

    fn publish_sync(&self, sender: mpsc::Sender<GossipMessage>) {
        let mut peers = self.switchboard.peers.lock();
        peers.entry(self.self_key).or_default().sync_inbound = Some(sender);
    }

    fn publish_transaction(&self, sender: mpsc::Sender<GossipMessage>) {
        let mut peers = self.switchboard.peers.lock();
        peers.entry(self.self_key).or_default().transaction_inbound = Some(sender);
    }

    fn route<'a>(peer: &'a Peer, topic: Topic) -> Option<&'a mpsc::Sender<GossipMessage>> {
        match topic {
            Topic::Sync => peer.sync_inbound.as_ref(),
            Topic::Transaction => peer.transaction_inbound.as_ref(),
        }
    }
}

#[async_trait]
impl GossipTransport for InMemoryTransport {
    async fn broadcast(&self, message: GossipMessage) -> Result<(), TransportError> {
        let topic = topic_of(&message);
        let peers = self.switchboard.peers.lock();
        for (key, peer) in peers.iter() {
            if *key == self.self_key {
                continue;
            }
            // Non-blocking: a slow/absent receiver drops the message rather than stalling
            // the broadcaster, matching the delivery contract for block-sync's inbound path.
            match Self::route(peer, topic) {
                Some(sender) if sender.try_send(message.clone()).is_ok() => {}
                Some(_) => trace!(peer = %key, "dropped broadcast message, receiver not ready"),
                None => trace!(peer = %key, "peer has no handler registered for this topic"),
            }
        }
        Ok(())
    }

    async fn send_to(&self, peer: PublicKey, message: GossipMessage) -> Result<(), TransportError> {
        let topic = topic_of(&message);
        let sender = {
            let peers = self.switchboard.peers.lock();
            peers.get(&peer).and_then(|p| Self::route(p, topic)).cloned()
        };
        let sender = sender.ok_or(TransportError::UnknownPeer(peer))?;
        sender
            .try_send(message)
            .map_err(|e| TransportError::SendFailed(peer, e.to_string()))
    }

    fn register_sync_handler(&self, handler: mpsc::Sender<GossipMessage>) {
        self.publish_sync(handler.clone());
        *self.sync_handler.lock() = Some(handler);
    }

    fn register_transaction_handler(&self, handler: mpsc::Sender<GossipMessage>) {
        self.publish_transaction(handler.clone());
        *self.transaction_handler.lock() = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{BlockAvailabilityRequest, ForwardedTransactions, SignedBatchRange};
    use rand::{rngs::StdRng, SeedableRng};
    use tn_types::{BlockHeight, BlockType, KeyPair};

    fn key(seed: u64) -> PublicKey {
        KeyPair::generate(&mut StdRng::seed_from_u64(seed)).public_key()
    }

    fn sample_message(sender: PublicKey) -> GossipMessage {
        GossipMessage::BlockAvailabilityRequest(BlockAvailabilityRequest {
            signed_batch_range: SignedBatchRange {
                block_type: BlockType::BlockPair,
                first_height: BlockHeight(1),
                last_height: BlockHeight(10),
                last_committed_height: BlockHeight(0),
                sender,
            },
        })
    }

    fn sample_transaction_message() -> GossipMessage {
        GossipMessage::ForwardedTransactions(ForwardedTransactions { signed_transactions: Vec::new() })
    }

    #[tokio::test]
    async fn broadcast_reaches_every_other_registered_peer() {
        let a_key = key(1);
        let b_key = key(2);
        let a = InMemoryTransport::new(a_key);
        let b = InMemoryTransport::join(&a, b_key);

        let (a_tx, mut a_rx) = mpsc::channel(8);
        let (b_tx, mut b_rx) = mpsc::channel(8);
        a.register_sync_handler(a_tx);
        b.register_sync_handler(b_tx);

        a.broadcast(sample_message(a_key)).await.unwrap();

        let received = b_rx.recv().await.expect("b should receive the broadcast");
        assert_eq!(received, sample_message(a_key));
        assert!(a_rx.try_recv().is_err(), "broadcaster should not receive its own message");
    }

    #[tokio::test]
    async fn send_to_unknown_peer_errors() {
        let a = InMemoryTransport::new(key(1));
        let err = a.send_to(key(2), sample_message(key(1))).await.unwrap_err();
        assert!(matches!(err, TransportError::UnknownPeer(_)));
    }

    #[tokio::test]
    async fn send_to_does_not_block_on_full_channel() {
        let a_key = key(1);
        let b_key = key(2);
        let a = InMemoryTransport::new(a_key);
        let b = InMemoryTransport::join(&a, b_key);
        let (b_tx, _b_rx) = mpsc::channel(1);
        b.register_sync_handler(b_tx.clone());
        // Fill the channel, then a second send should fail fast instead of blocking.
        b_tx.try_send(sample_message(a_key)).unwrap();
        let err = a.send_to(b_key, sample_message(a_key)).await.unwrap_err();
        assert!(matches!(err, TransportError::SendFailed(_, _)));
    }

    #[tokio::test]
    async fn sync_and_transaction_topics_are_delivered_independently() {
        let a_key = key(1);
        let b_key = key(2);
        let a = InMemoryTransport::new(a_key);
        let b = InMemoryTransport::join(&a, b_key);

        let (b_sync_tx, mut b_sync_rx) = mpsc::channel(8);
        let (b_tx_tx, mut b_tx_rx) = mpsc::channel(8);
        b.register_sync_handler(b_sync_tx);
        b.register_transaction_handler(b_tx_tx);

        a.broadcast(sample_message(a_key)).await.unwrap();
        a.broadcast(sample_transaction_message()).await.unwrap();

        assert_eq!(b_sync_rx.recv().await.unwrap(), sample_message(a_key));
        assert_eq!(b_tx_rx.recv().await.unwrap(), sample_transaction_message());
        assert!(b_sync_rx.try_recv().is_err(), "sync topic should not see the transaction message");
        assert!(b_tx_rx.try_recv().is_err(), "transaction topic should not see the sync message");
    }
}
