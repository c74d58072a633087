use thiserror::Error;
use tn_types::{BlockHeight, RejectionReason};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("block tracker: target height {target} is more than the grace distance ahead of current height {current}")]
    TooFarAhead { target: BlockHeight, current: BlockHeight },

    #[error("block tracker: timed out waiting for block height")]
    Timeout,

    #[error("transaction rejected: {0:?}")]
    TransactionRejected(RejectionReason),
}

impl From<RejectionReason> for PoolError {
    fn from(reason: RejectionReason) -> Self {
        PoolError::TransactionRejected(reason)
    }
}
