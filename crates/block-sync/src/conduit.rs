//! The inbound delivery path from the gossip transport into the state machine's single
//! consumer task.
//!
//! Registration with the transport hands it a plain [`tokio::sync::mpsc::Sender`]; the
//! transport (or its fake) is expected to use `try_send` so that a state machine which is
//! not currently awaiting the channel never stalls the sender.

use tn_network::GossipMessage;
use tokio::sync::mpsc;

/// Capacity chosen to absorb a burst of availability responses from a whole federation
/// without needing the sender to block; anything beyond this is dropped, matching the
/// "never block on a not-ready consumer" delivery contract.
pub const CONDUIT_CAPACITY: usize = 64;

pub fn new_conduit() -> (mpsc::Sender<GossipMessage>, mpsc::Receiver<GossipMessage>) {
    mpsc::channel(CONDUIT_CAPACITY)
}
