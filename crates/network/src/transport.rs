use async_trait::async_trait;
use tn_types::PublicKey;

use crate::{error::TransportError, messages::GossipMessage};

/// The gossip transport contract the sync and transaction-pool cores depend on.
///
/// Broadcast and unicast are both fire-and-forget from the caller's perspective: delivery
/// is asynchronous and a successful return only means the message left this node.
/// Inbound messages reach each core on its own topic, mirroring the corpus's separate
/// `gossiptopics` interfaces per subsystem rather than one shared handler: block-sync's
/// four message kinds arrive through [`GossipTransport::register_sync_handler`] and
/// [`ForwardedTransactions`](crate::messages::ForwardedTransactions) through
/// [`GossipTransport::register_transaction_handler`]. There is no poll-based receive.
#[async_trait]
pub trait GossipTransport: Send + Sync {
    /// Sends `message` to every known peer.
    async fn broadcast(&self, message: GossipMessage) -> Result<(), TransportError>;

    /// Sends `message` to exactly one peer.
    async fn send_to(&self, peer: PublicKey, message: GossipMessage) -> Result<(), TransportError>;

    /// Registers the handler for block-sync's message kinds (the two availability and two
    /// chunk messages). Only one handler is kept; registering again replaces it. Delivery
    /// to the handler's channel never blocks the transport: see
    /// [`crate::fake::InMemoryTransport`] for the canonical non-blocking delivery
    /// semantics a real implementation should match.
    fn register_sync_handler(&self, handler: tokio::sync::mpsc::Sender<GossipMessage>);

    /// Registers the handler for `ForwardedTransactions` relay. Only one handler is kept;
    /// registering again replaces it. Independent of the sync handler so the transaction
    /// pool and block-sync can each own their conduit on a shared transport.
    fn register_transaction_handler(&self, handler: tokio::sync::mpsc::Sender<GossipMessage>);
}
