//! The transaction pool (§4.4): admission, committed-receipt lookups, pre-order validation
//! ahead of block proposal, and gossip propagation of newly admitted transactions.

mod block_tracker;
mod committed_pool;
mod error;
mod forward_queue;
mod pending_pool;
mod pool;
mod validation_context;
mod vm;

pub use error::PoolError;
pub use pool::{spawn_transaction_pool_tasks, TransactionPool};
pub use vm::VirtualMachine;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rand::{rngs::StdRng, SeedableRng};
    use tn_config::{NodeConfigBuilder, Timeouts};
    use tn_network::{ForwardedTransactions, GossipMessage, GossipTransport, InMemoryTransport};
    use tn_types::{
        BlockHeight, FederationNode, KeyPair, PreOrderStatus, RejectionReason, SignedTransaction,
        Transaction, TransactionReceipt, TransactionStatus, VirtualChainId,
    };

    use super::*;

    struct AlwaysValidVm;

    #[async_trait]
    impl VirtualMachine for AlwaysValidVm {
        async fn transaction_set_pre_order(
            &self,
            _block_height: BlockHeight,
            signed_transactions: &[SignedTransaction],
        ) -> Vec<PreOrderStatus> {
            vec![PreOrderStatus::PreOrderValid; signed_transactions.len()]
        }
    }

    fn signed_tx(key: &KeyPair, timestamp: i64) -> SignedTransaction {
        let tx = Transaction {
            virtual_chain_id: VirtualChainId(1),
            timestamp,
            signer_public_key: key.public_key(),
            contract_name: "BenchmarkToken".to_string(),
            method_name: "transfer".to_string(),
            input_arguments: vec![1, 2, 3],
        };
        let signature = key.sign(tx.hash().as_bytes());
        SignedTransaction { transaction: tx, signature }
    }

    fn harness(leader: &KeyPair) -> Arc<TransactionPool> {
        let transport: Arc<dyn GossipTransport> = Arc::new(InMemoryTransport::new(leader.public_key()));
        harness_with_transport(leader, transport)
    }

    fn harness_with_transport(leader: &KeyPair, transport: Arc<dyn GossipTransport>) -> Arc<TransactionPool> {
        let mut timeouts = Timeouts::default();
        timeouts.transaction_pool_future_timestamp_grace_timeout = std::time::Duration::from_secs(3600);
        timeouts.transaction_pool_transaction_expiration_window = std::time::Duration::from_secs(3600);
        let config = NodeConfigBuilder::new()
            .node_key_pair(leader.clone())
            .add_federation_node(FederationNode { public_key: leader.public_key() })
            .consensus_required_quorum_percentage(66)
            .timeouts(timeouts)
            .build()
            .expect("valid config");
        TransactionPool::new(config, Arc::new(AlwaysValidVm), transport)
    }

    #[test]
    fn submit_then_query_reports_pending() {
        let leader = KeyPair::generate(&mut StdRng::seed_from_u64(1));
        let pool = harness(&leader);
        let tx = signed_tx(&leader, 0);
        let hash = tx.tx_hash();
        pool.submit_transaction(tx).expect("admitted");
        assert_eq!(pool.get_committed_transaction_receipt(hash, 0), TransactionStatus::Pending);
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let leader = KeyPair::generate(&mut StdRng::seed_from_u64(2));
        let pool = harness(&leader);
        let tx = signed_tx(&leader, 0);
        pool.submit_transaction(tx.clone()).expect("first admitted");
        let err = pool.submit_transaction(tx).unwrap_err();
        assert_eq!(err, RejectionReason::DuplicateTransaction);
    }

    #[test]
    fn query_before_any_record_reports_no_record_found() {
        let leader = KeyPair::generate(&mut StdRng::seed_from_u64(3));
        let pool = harness(&leader);
        let unseen = signed_tx(&leader, 0).tx_hash();
        assert_eq!(pool.get_committed_transaction_receipt(unseen, 0), TransactionStatus::NoRecordFound);
    }

    #[test]
    fn commit_moves_transaction_from_pending_to_committed() {
        let leader = KeyPair::generate(&mut StdRng::seed_from_u64(4));
        let pool = harness(&leader);
        let tx = signed_tx(&leader, 0);
        let hash = tx.tx_hash();
        pool.submit_transaction(tx.clone()).expect("admitted");

        let receipt = TransactionReceipt { tx_hash: hash, success: true, result_data: vec![] };
        pool.notify_committed_block(BlockHeight(1), 1_000, &[tx], &[receipt.clone()]);

        assert_eq!(
            pool.get_committed_transaction_receipt(hash, 1_000),
            TransactionStatus::Committed(receipt)
        );
        assert_eq!(pool.pending_len(), 0);
    }

    #[tokio::test]
    async fn validate_transactions_for_ordering_waits_for_block_height() {
        let leader = KeyPair::generate(&mut StdRng::seed_from_u64(5));
        let pool = harness(&leader);
        let tx = signed_tx(&leader, 0);

        let pool_clone = pool.clone();
        let txs = vec![tx];
        let handle = tokio::spawn(async move {
            pool_clone.validate_transactions_for_ordering(BlockHeight(1), &txs).await
        });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        pool.notify_committed_block(BlockHeight(1), 0, &[], &[]);

        handle.await.expect("task joined").expect("validation succeeded");
    }

    #[tokio::test]
    async fn forwarded_transaction_from_peer_reaches_the_local_pool() {
        let node_a = KeyPair::generate(&mut StdRng::seed_from_u64(6));
        let node_b = KeyPair::generate(&mut StdRng::seed_from_u64(7));

        let fake_a = InMemoryTransport::new(node_a.public_key());
        let fake_b = InMemoryTransport::join(&fake_a, node_b.public_key());

        let pool_a = harness_with_transport(&node_a, Arc::new(fake_a));
        let pool_b = harness_with_transport(&node_b, Arc::new(fake_b));

        let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        let handles_a = spawn_transaction_pool_tasks(pool_a.clone(), cancel_rx.clone());
        let handles_b = spawn_transaction_pool_tasks(pool_b.clone(), cancel_rx.clone());

        let tx = signed_tx(&node_b, 0);
        let hash = tx.tx_hash();
        pool_b.submit_transaction(tx).expect("b admits its own transaction");

        // Give the batcher a moment to flush and the relay consumer on A a moment to drain.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        assert_eq!(pool_a.get_committed_transaction_receipt(hash, 0), TransactionStatus::Pending);

        let _ = cancel_tx.send(true);
        for handle in handles_a.into_iter().chain(handles_b) {
            handle.abort();
        }
    }
}
