use thiserror::Error;
use tn_types::PublicKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockSyncError {
    /// A `BlockSyncResponse` arrived from someone other than the chosen sync source. The
    /// current attempt is aborted back to `Idle`; this is surfaced only for logging, since
    /// the state machine itself already resolves it internally.
    #[error("byzantine response: expected source {expected}, got {got}")]
    ByzantineSource { expected: PublicKey, got: PublicKey },
}
