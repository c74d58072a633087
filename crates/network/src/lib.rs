//! The gossip transport contract (§4.2): broadcast/unicast of the four block-sync message
//! kinds plus transaction relay, and an in-memory fake for tests.

mod error;
mod fake;
mod messages;
mod transport;

pub use error::TransportError;
pub use fake::InMemoryTransport;
pub use messages::{
    BlockAvailabilityRequest, BlockAvailabilityResponse, BlockSyncRequest, BlockSyncResponse,
    ForwardedTransactions, GossipMessage, SignedBatchRange,
};
pub use transport::GossipTransport;
