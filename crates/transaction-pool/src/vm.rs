use async_trait::async_trait;
use tn_types::{BlockHeight, PreOrderStatus, SignedTransaction};

/// The out-of-scope virtual machine's pre-order contract (§6): given the transactions a
/// block would contain, say whether each one is admissible at this position in the chain.
#[async_trait]
pub trait VirtualMachine: Send + Sync {
    async fn transaction_set_pre_order(
        &self,
        block_height: BlockHeight,
        signed_transactions: &[SignedTransaction],
    ) -> Vec<PreOrderStatus>;
}
