use thiserror::Error;
use tn_types::PublicKey;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer {0} is not known to this transport")]
    UnknownPeer(PublicKey),

    #[error("send to peer {0} failed: {1}")]
    SendFailed(PublicKey, String),

    #[error("broadcast failed: {0}")]
    BroadcastFailed(String),
}
