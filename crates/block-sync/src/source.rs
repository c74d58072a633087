//! The source/responder side of block-sync (§4.3, §6): every node answers other peers'
//! availability and chunk requests out of its own storage, concurrently with running its
//! own petitioner state machine. The original dispatches both roles from the same inbound
//! loop; here, each petitioner state forwards a request it does not itself consume to
//! [`Driver::handle_source_request`] instead of discarding it outright.

use tn_network::{
    BlockAvailabilityResponse, BlockSyncResponse, GossipMessage, SignedBatchRange,
};
use tn_types::BlockHeight;
use tracing::{trace, warn};

use super::Driver;

impl Driver {
    /// Inspects an inbound message for a source-side request this node can answer, and
    /// answers it if so. Any other message kind (including this node's own petitioner
    /// inputs) is left untouched so the calling state can still discard or use it as usual.
    pub(crate) async fn handle_source_request(&self, message: &GossipMessage) {
        match message {
            GossipMessage::BlockAvailabilityRequest(request) => {
                self.answer_availability_request(&request.signed_batch_range).await;
            }
            GossipMessage::BlockSyncRequest(request) => {
                self.answer_sync_request(&request.signed_chunk_range).await;
            }
            _ => {}
        }
    }

    /// Caps a requested range's span to the configured batch size (§4.3 tie-break).
    fn cap_to_batch_size(&self, first: BlockHeight, last: BlockHeight) -> BlockHeight {
        let batch_size = self.config.timeouts().block_sync_batch_size as u64;
        if batch_size == 0 {
            return last;
        }
        let capped = first + (batch_size - 1);
        if capped < last {
            capped
        } else {
            last
        }
    }

    async fn answer_availability_request(&self, requested: &SignedBatchRange) {
        let last_committed = self.storage.last_committed_block_height();
        // A source with nothing committed has nothing newer to offer; ignore silently.
        if last_committed.is_none() {
            self.metrics.source.availability_requests_ignored.increment();
            return;
        }

        let response = GossipMessage::BlockAvailabilityResponse(BlockAvailabilityResponse {
            signed_batch_range: SignedBatchRange {
                block_type: requested.block_type,
                first_height: requested.first_height,
                last_height: self.cap_to_batch_size(requested.first_height, requested.last_height),
                last_committed_height: last_committed,
                sender: self.config.node_public_key(),
            },
        });
        if let Err(e) = self.transport.send_to(requested.sender, response).await {
            warn!(error = %e, requester = %requested.sender, "failed to answer availability request");
            return;
        }
        self.metrics.source.availability_requests_answered.increment();
    }

    async fn answer_sync_request(&self, requested: &SignedBatchRange) {
        let last_committed = self.storage.last_committed_block_height();
        if last_committed.is_none() {
            self.metrics.source.sync_requests_ignored.increment();
            return;
        }

        let capped_last = self.cap_to_batch_size(requested.first_height, requested.last_height);
        let (block_pairs, first_available, last_available) =
            self.storage.get_blocks(requested.first_height, capped_last);
        if block_pairs.is_empty() {
            trace!(requester = %requested.sender, "no blocks available to answer sync request");
            self.metrics.source.sync_requests_ignored.increment();
            return;
        }

        let response = GossipMessage::BlockSyncResponse(BlockSyncResponse {
            signed_chunk_range: SignedBatchRange {
                block_type: requested.block_type,
                first_height: first_available,
                last_height: last_available,
                last_committed_height: last_committed,
                sender: self.config.node_public_key(),
            },
            block_pairs,
        });
        if let Err(e) = self.transport.send_to(requested.sender, response).await {
            warn!(error = %e, requester = %requested.sender, "failed to answer sync request");
            return;
        }
        self.metrics.source.sync_requests_answered.increment();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use consensus_metrics::MetricsFactory;
    use rand::{rngs::StdRng, SeedableRng};
    use tn_benchmark_consensus::BenchmarkConsensusCore;
    use tn_config::{NodeConfigBuilder, Timeouts};
    use tn_network::{GossipTransport, InMemoryTransport};
    use tn_storage::{BlockStorage, InMemoryBlockStorage};
    use tn_types::{
        BlockHeader, BlockPair, BlockProof, BlockProofType, BlockType, FederationNode, Hash, KeyPair,
        ResultsBlock, SenderSignature, TransactionsBlock,
    };
    use tokio::sync::watch;

    use super::*;
    use crate::{conduit::new_conduit, metrics::StateMetrics, states::Driver};

    fn block_pair_at(height: u64, prev: Hash, key: &KeyPair) -> BlockPair {
        let header = BlockHeader {
            block_height: BlockHeight(height),
            prev_block_hash_ptr: prev,
            timestamp: height as i64,
        };
        let proof =
            BlockProof { proof_type: BlockProofType::BenchmarkConsensus, sender: SenderSignature {
                public_key: key.public_key(),
                signature: key.sign(b"x"),
            } };
        BlockPair {
            transactions_block: TransactionsBlock { header, proof, transactions: Vec::new() },
            results_block: ResultsBlock { header, proof, receipts: Vec::new() },
        }
    }

    fn test_driver(leader: KeyPair, storage: Arc<dyn BlockStorage>) -> Driver {
        let mut timeouts = Timeouts::default();
        timeouts.block_sync_batch_size = 5;
        let config = NodeConfigBuilder::new()
            .node_key_pair(leader.clone())
            .add_federation_node(FederationNode { public_key: leader.public_key() })
            .constant_consensus_leader(leader.public_key())
            .consensus_required_quorum_percentage(66)
            .timeouts(timeouts)
            .build()
            .expect("valid config");
        let transport: Arc<dyn GossipTransport> = Arc::new(InMemoryTransport::new(leader.public_key()));
        let consensus = Arc::new(BenchmarkConsensusCore::new(leader.public_key(), storage.clone()));
        let metrics = Arc::new(StateMetrics::new(&MetricsFactory::new()));
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        let (_sender, receiver) = new_conduit();
        Driver::new(config, storage, transport, consensus, metrics, receiver, cancel_rx)
    }

    #[tokio::test]
    async fn ignores_availability_request_when_nothing_committed() {
        let leader = KeyPair::generate(&mut StdRng::seed_from_u64(1));
        let storage: Arc<dyn BlockStorage> = Arc::new(InMemoryBlockStorage::new());
        let driver = test_driver(leader.clone(), storage);

        driver
            .answer_availability_request(&SignedBatchRange {
                block_type: BlockType::BlockPair,
                first_height: BlockHeight(1),
                last_height: BlockHeight(5),
                last_committed_height: BlockHeight::NONE,
                sender: leader.public_key(),
            })
            .await;
        assert_eq!(driver.metrics.source.availability_requests_ignored.get(), 1);
        assert_eq!(driver.metrics.source.availability_requests_answered.get(), 0);
    }

    #[tokio::test]
    async fn answers_sync_request_capped_to_batch_size_and_delivers_to_requester() {
        let leader = KeyPair::generate(&mut StdRng::seed_from_u64(2));
        let storage: Arc<dyn BlockStorage> = Arc::new(InMemoryBlockStorage::new());
        for h in 1..=10u64 {
            storage.commit_block(block_pair_at(h, Hash::ZERO, &leader)).unwrap();
        }
        let mut driver = test_driver(leader.clone(), storage);

        // Join a second transport handle onto the same switchboard under the requester's
        // key, and swap it in as the driver's transport so `send_to(requester, ..)` resolves.
        let leader_transport = InMemoryTransport::new(leader.public_key());
        let requester_key = KeyPair::generate(&mut StdRng::seed_from_u64(3));
        let requester_transport = InMemoryTransport::join(&leader_transport, requester_key.public_key());
        let (requester_tx, mut requester_rx) = tokio::sync::mpsc::channel(8);
        requester_transport.register_sync_handler(requester_tx);
        driver.transport = Arc::new(leader_transport);

        driver
            .answer_sync_request(&SignedBatchRange {
                block_type: BlockType::BlockPair,
                first_height: BlockHeight(1),
                last_height: BlockHeight(10),
                last_committed_height: BlockHeight::NONE,
                sender: requester_key.public_key(),
            })
            .await;

        assert_eq!(driver.metrics.source.sync_requests_answered.get(), 1);
        let GossipMessage::BlockSyncResponse(response) =
            requester_rx.recv().await.expect("requester should receive the response")
        else {
            panic!("expected a BlockSyncResponse");
        };
        // Batch size is 5, so the 10-height request is capped to 5 block pairs.
        assert_eq!(response.block_pairs.len(), 5);
        assert_eq!(response.signed_chunk_range.last_height, BlockHeight(5));
    }
}
