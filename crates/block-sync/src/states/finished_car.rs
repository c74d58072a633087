use std::time::Instant;

use rand::seq::SliceRandom;
use tn_network::BlockAvailabilityResponse;

use super::{Driver, SyncState};

impl Driver {
    /// Picks a sync source from the accumulated availability responses, or falls back to
    /// `Idle` if none are usable.
    pub(crate) async fn process_finished_car(
        &mut self,
        responses: Vec<BlockAvailabilityResponse>,
    ) -> Option<SyncState> {
        if self.is_cancelled() {
            return None;
        }
        let start = Instant::now();
        if responses.is_empty() {
            self.metrics.finished_car.times_no_responses.increment();
            self.metrics.finished_car.state_latency.record(start.elapsed());
            return Some(SyncState::Idle);
        }

        let local_last_committed = self.storage.last_committed_block_height();
        let candidates: Vec<&BlockAvailabilityResponse> = responses
            .iter()
            .filter(|r| r.signed_batch_range.last_committed_height > local_last_committed)
            .collect();

        self.metrics.finished_car.state_latency.record(start.elapsed());
        if candidates.is_empty() {
            self.metrics.finished_car.times_no_responses.increment();
            return Some(SyncState::Idle);
        }
        self.metrics.finished_car.times_with_responses.increment();

        let chosen = candidates.choose(&mut rand::thread_rng()).expect("non-empty candidates");
        Some(SyncState::WaitingForChunks(chosen.signed_batch_range.sender))
    }
}
