use thiserror::Error;
use tn_types::BlockHeight;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("block height {0} is never committed")]
    ZeroHeightCommit(BlockHeight),

    #[error("non-contiguous commit: expected height {expected}, got {got}")]
    NonContiguousHeight { expected: BlockHeight, got: BlockHeight },
}
