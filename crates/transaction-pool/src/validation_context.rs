use tn_types::{RejectionReason, TimestampNano, Transaction, VirtualChainId};

/// A snapshot of the state a transaction is validated against: the last-committed block's
/// timestamp plus the pool's configured tolerances. Rebuilt on every admission so the checks
/// never race a concurrent commit.
pub struct ValidationContext {
    pub expiry_window: TimestampNano,
    pub last_committed_block_timestamp: TimestampNano,
    pub future_timestamp_grace: TimestampNano,
    pub virtual_chain_id: VirtualChainId,
}

impl ValidationContext {
    /// The four ordered admission checks; the first failure wins.
    pub fn validate(
        &self,
        tx: &Transaction,
        already_pending: bool,
        already_committed: bool,
    ) -> Result<(), RejectionReason> {
        if already_pending || already_committed {
            return Err(RejectionReason::DuplicateTransaction);
        }
        if tx.timestamp < self.last_committed_block_timestamp - self.expiry_window {
            return Err(RejectionReason::TimestampExpired);
        }
        if tx.timestamp > self.last_committed_block_timestamp + self.future_timestamp_grace {
            return Err(RejectionReason::TimestampAheadOfNode);
        }
        if tx.virtual_chain_id != self.virtual_chain_id {
            return Err(RejectionReason::VirtualChainMismatch);
        }
        Ok(())
    }
}
