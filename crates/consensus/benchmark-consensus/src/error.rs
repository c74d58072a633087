use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("unsupported block type")]
    UnsupportedBlockType,

    #[error("incorrect block proof type")]
    IncorrectProofType,

    #[error("transactions prev block hash does not match prior committed block")]
    TransactionsPrevHashMismatch,

    #[error("results prev block hash does not match prior committed block")]
    ResultsPrevHashMismatch,

    #[error("block proof is not from the configured leader")]
    NotFromLeader,

    #[error("block proof signature is invalid")]
    InvalidSignature,

    #[error("aborting shared state update: last-committed-block changed concurrently")]
    ConcurrentCommitConflict,
}
