use std::time::Instant;

use tn_network::{BlockAvailabilityRequest, GossipMessage, SignedBatchRange};
use tn_types::BlockType;
use tracing::warn;

use super::{Driver, SyncState};

impl Driver {
    /// Broadcasts a `BlockAvailabilityRequest` for the next batch beyond our tip, then
    /// accumulates every `BlockAvailabilityResponse` until the collect-response timeout.
    pub(crate) async fn process_collecting(&mut self) -> Option<SyncState> {
        if self.is_cancelled() {
            return None;
        }
        let start = Instant::now();
        let last_committed = self.storage.last_committed_block_height();
        let batch_size = self.config.timeouts().block_sync_batch_size as u64;

        let request = GossipMessage::BlockAvailabilityRequest(BlockAvailabilityRequest {
            signed_batch_range: SignedBatchRange {
                block_type: BlockType::BlockPair,
                first_height: last_committed.next(),
                last_height: last_committed + batch_size,
                last_committed_height: last_committed,
                sender: self.config.node_public_key(),
            },
        });
        if let Err(e) = self.transport.broadcast(request).await {
            warn!(error = %e, "failed to broadcast block availability request");
        }

        let collect_timeout = self.config.timeouts().block_sync_collect_response_timeout;
        let timer = tokio::time::sleep(collect_timeout);
        tokio::pin!(timer);
        let mut responses = Vec::new();

        loop {
            tokio::select! {
                _ = self.cancel.changed() => {
                    return None;
                }
                _ = &mut timer => {
                    self.metrics.collecting.state_latency.record(start.elapsed());
                    if !responses.is_empty() {
                        self.metrics.collecting.times_successful.increment();
                    }
                    return Some(SyncState::FinishedCAR(responses));
                }
                message = self.inbound.recv() => {
                    match message {
                        Some(GossipMessage::BlockAvailabilityResponse(response)) => {
                            responses.push(response);
                        }
                        Some(other) => self.handle_source_request(&other).await,
                        None => return None,
                    }
                }
            }
        }
    }
}
