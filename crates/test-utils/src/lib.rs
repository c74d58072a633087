//! Shared test scaffolding: deterministic key generation, a fast-timeout harness
//! configuration, and fakes for the collaborators this core does not itself implement (the
//! virtual machine).
//!
//! Every helper here takes its randomness and tunables as explicit parameters rather than
//! reaching for a mutable global, so that two tests running in the same process never
//! interfere with each other (§9).

use std::sync::Arc;

use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use tn_config::{NodeConfig, NodeConfigBuilder, Timeouts};
use tn_network::{GossipTransport, InMemoryTransport};
use tn_types::{BlockHeight, FederationNode, KeyPair, PreOrderStatus, PublicKey, SignedTransaction, Transaction, VirtualChainId};
use tn_transaction_pool::VirtualMachine;

/// Deterministically derives a key pair from a small integer seed, so tests that need
/// multiple distinct identities can name them by number instead of threading an RNG through.
pub fn test_key(seed: u64) -> KeyPair {
    KeyPair::generate(&mut StdRng::seed_from_u64(seed))
}

/// Builds tight-but-not-zero timeouts suitable for driving state transitions quickly in
/// tests without tripping over `start_paused` clock semantics.
pub fn fast_timeouts() -> Timeouts {
    let mut timeouts = Timeouts::default();
    let fast = std::time::Duration::from_millis(50);
    timeouts.block_sync_no_commit_interval = fast;
    timeouts.block_sync_collect_response_timeout = fast;
    timeouts.block_sync_collect_chunks_timeout = fast;
    timeouts.block_tracker_grace_timeout = fast;
    timeouts.transaction_pool_pending_pool_clear_expired_interval = fast;
    timeouts.transaction_pool_committed_pool_clear_expired_interval = fast;
    timeouts.transaction_pool_propagation_batching_timeout = fast;
    timeouts
}

/// Builds a single-node federation config: `leader` is both the only federation member and
/// the constant consensus leader.
pub fn single_node_config(leader: &KeyPair) -> NodeConfig {
    NodeConfigBuilder::new()
        .node_key_pair(leader.clone())
        .add_federation_node(FederationNode { public_key: leader.public_key() })
        .constant_consensus_leader(leader.public_key())
        .consensus_required_quorum_percentage(66)
        .timeouts(fast_timeouts())
        .build()
        .expect("harness config is always valid")
}

/// Builds a multi-node federation config for `node_key`, with `leader` set as the constant
/// consensus leader shared by every member.
pub fn federation_config(node_key: &KeyPair, leader: &KeyPair, members: &[KeyPair]) -> NodeConfig {
    NodeConfigBuilder::new()
        .node_key_pair(node_key.clone())
        .federation_nodes(members.iter().map(|k| FederationNode { public_key: k.public_key() }))
        .constant_consensus_leader(leader.public_key())
        .consensus_required_quorum_percentage(66)
        .timeouts(fast_timeouts())
        .build()
        .expect("harness config is always valid")
}

/// Builds and signs a transaction for `signer` with fixed, harmless contract call fields.
pub fn signed_transaction(signer: &KeyPair, virtual_chain_id: u32, timestamp: i64) -> SignedTransaction {
    let transaction = Transaction {
        virtual_chain_id: VirtualChainId(virtual_chain_id),
        timestamp,
        signer_public_key: signer.public_key(),
        contract_name: "BenchmarkToken".to_string(),
        method_name: "transfer".to_string(),
        input_arguments: vec![1, 2, 3],
    };
    let signature = signer.sign(transaction.hash().as_bytes());
    SignedTransaction { transaction, signature }
}

/// Builds a set of [`InMemoryTransport`]s already joined to the same switchboard, one per
/// key, so a multi-node test can broadcast and unicast between them immediately.
pub fn joined_transports(keys: &[KeyPair]) -> Vec<Arc<dyn GossipTransport>> {
    let mut transports = Vec::with_capacity(keys.len());
    let mut iter = keys.iter();
    let Some(first_key) = iter.next() else {
        return transports;
    };
    let root = InMemoryTransport::new(first_key.public_key());
    transports.push(Arc::new(root.clone()) as Arc<dyn GossipTransport>);
    for key in iter {
        let joined = InMemoryTransport::join(&root, key.public_key());
        transports.push(Arc::new(joined) as Arc<dyn GossipTransport>);
    }
    transports
}

/// The virtual machine fake (§6): every transaction set is unconditionally pre-order valid,
/// since block/transaction execution itself is out of scope for this core.
pub struct AlwaysValidVirtualMachine;

#[async_trait]
impl VirtualMachine for AlwaysValidVirtualMachine {
    async fn transaction_set_pre_order(
        &self,
        _block_height: BlockHeight,
        signed_transactions: &[SignedTransaction],
    ) -> Vec<PreOrderStatus> {
        vec![PreOrderStatus::PreOrderValid; signed_transactions.len()]
    }
}

/// A virtual machine fake that rejects every transaction signed by `banned`, useful for
/// exercising the `PreOrderFailed` path without fabricating a malformed transaction.
pub struct RejectSignerVirtualMachine {
    pub banned: PublicKey,
}

#[async_trait]
impl VirtualMachine for RejectSignerVirtualMachine {
    async fn transaction_set_pre_order(
        &self,
        _block_height: BlockHeight,
        signed_transactions: &[SignedTransaction],
    ) -> Vec<PreOrderStatus> {
        signed_transactions
            .iter()
            .map(|tx| {
                if tx.transaction.signer_public_key == self.banned {
                    PreOrderStatus::PreOrderInvalid
                } else {
                    PreOrderStatus::PreOrderValid
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic_per_seed() {
        assert_eq!(test_key(7).public_key(), test_key(7).public_key());
        assert_ne!(test_key(7).public_key(), test_key(8).public_key());
    }

    #[test]
    fn single_node_config_is_always_valid() {
        let leader = test_key(1);
        let config = single_node_config(&leader);
        assert_eq!(config.network_size(0), 1);
        assert_eq!(config.constant_consensus_leader(), leader.public_key());
    }

    #[tokio::test]
    async fn always_valid_vm_accepts_everything() {
        let signer = test_key(2);
        let tx = signed_transaction(&signer, 1, 0);
        let statuses =
            AlwaysValidVirtualMachine.transaction_set_pre_order(BlockHeight(1), &[tx]).await;
        assert_eq!(statuses, vec![PreOrderStatus::PreOrderValid]);
    }

    #[tokio::test]
    async fn reject_signer_vm_flags_only_the_banned_signer() {
        let banned = test_key(3);
        let allowed = test_key(4);
        let vm = RejectSignerVirtualMachine { banned: banned.public_key() };
        let txs = vec![signed_transaction(&banned, 1, 0), signed_transaction(&allowed, 1, 0)];
        let statuses = vm.transaction_set_pre_order(BlockHeight(1), &txs).await;
        assert_eq!(statuses, vec![PreOrderStatus::PreOrderInvalid, PreOrderStatus::PreOrderValid]);
    }
}
