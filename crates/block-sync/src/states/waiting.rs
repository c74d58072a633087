use std::time::Instant;

use tn_network::{BlockSyncRequest, GossipMessage, SignedBatchRange};
use tn_types::{BlockType, PublicKey};
use tracing::{info, warn};

use super::{Driver, SyncState};

impl Driver {
    /// Requests the next chunk from `source` and waits for its reply, flagging any response
    /// from a different sender as byzantine.
    pub(crate) async fn process_waiting(&mut self, source: PublicKey) -> Option<SyncState> {
        if self.is_cancelled() {
            return None;
        }
        let start = Instant::now();
        let last_committed = self.storage.last_committed_block_height();
        let batch_size = self.config.timeouts().block_sync_batch_size as u64;

        let request = GossipMessage::BlockSyncRequest(BlockSyncRequest {
            signed_chunk_range: SignedBatchRange {
                block_type: BlockType::BlockPair,
                first_height: last_committed.next(),
                last_height: last_committed + batch_size,
                last_committed_height: last_committed,
                sender: self.config.node_public_key(),
            },
        });
        if let Err(e) = self.transport.send_to(source, request).await {
            warn!(error = %e, %source, "could not request block chunk from source");
            self.metrics.waiting.state_latency.record(start.elapsed());
            return Some(SyncState::Idle);
        }

        let collect_timeout = self.config.timeouts().block_sync_collect_chunks_timeout;
        let timer = tokio::time::sleep(collect_timeout);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                _ = self.cancel.changed() => {
                    return None;
                }
                _ = &mut timer => {
                    info!(%source, "timed out waiting for chunks");
                    self.metrics.waiting.times_timeout.increment();
                    self.metrics.waiting.state_latency.record(start.elapsed());
                    return Some(SyncState::Idle);
                }
                message = self.inbound.recv() => {
                    match message {
                        Some(GossipMessage::BlockSyncResponse(response)) => {
                            if response.signed_chunk_range.sender != source {
                                warn!(
                                    expected = %source,
                                    got = %response.signed_chunk_range.sender,
                                    "byzantine message detected, sender does not match source"
                                );
                                self.metrics.waiting.times_byzantine.increment();
                                self.metrics.waiting.state_latency.record(start.elapsed());
                                return Some(SyncState::Idle);
                            }
                            self.metrics.waiting.times_successful.increment();
                            self.metrics.waiting.state_latency.record(start.elapsed());
                            return Some(SyncState::Processing(response));
                        }
                        Some(other) => self.handle_source_request(&other).await,
                        None => return None,
                    }
                }
            }
        }
    }
}
