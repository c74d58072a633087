use std::time::Instant;

use tn_benchmark_consensus::HandleBlockConsensusMode;
use tn_network::BlockSyncResponse;
use tn_types::BlockType;
use tracing::{info, warn};

use super::{Driver, SyncState};

impl Driver {
    /// Commits every block pair in `response`, in order, always returning to `Idle`
    /// afterwards regardless of how many pairs succeeded.
    pub(crate) async fn process_processing(
        &mut self,
        response: BlockSyncResponse,
    ) -> Option<SyncState> {
        let start = Instant::now();
        let mut committed = 0u64;
        let mut failed_validation = 0u64;
        let mut failed_commit = 0u64;

        for block_pair in response.block_pairs {
            let height = block_pair.block_height();
            if let Err(e) = self.consensus.handle_block_consensus(
                HandleBlockConsensusMode::VerifyOnly,
                BlockType::BlockPair,
                block_pair.clone(),
            ) {
                warn!(%height, error = %e, "failed to validate synced block");
                failed_validation += 1;
                continue;
            }

            match self.storage.commit_block(block_pair.clone()) {
                Ok(()) => {
                    committed += 1;
                    if let Err(e) = self.consensus.handle_block_consensus(
                        HandleBlockConsensusMode::UpdateOnly,
                        BlockType::BlockPair,
                        block_pair,
                    ) {
                        warn!(%height, error = %e, "consensus view update lagged behind storage commit");
                    }
                }
                Err(e) => {
                    warn!(%height, error = %e, "failed to commit synced block");
                    failed_commit += 1;
                }
            }
        }

        self.metrics.processing.state_latency.record(start.elapsed());
        self.metrics.processing.blocks_rate.measure(committed);
        self.metrics.processing.committed_blocks.set(committed as i64);
        self.metrics.processing.failed_commit_blocks.set(failed_commit as i64);
        self.metrics.processing.failed_validation_blocks.set(failed_validation as i64);
        info!(committed, failed_validation, failed_commit, "finished processing synced blocks");

        Some(SyncState::Idle)
    }
}
