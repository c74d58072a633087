use std::time::Instant;

use tracing::info;

use super::{Driver, SyncState};

impl Driver {
    /// Waits for either a commit notification (rearm) or the no-commit timeout (advance to
    /// `CollectingAvailability`). `Idle` has no petitioner input of its own, but still answers
    /// any inbound availability/sync request from a peer.
    pub(crate) async fn process_idle(&mut self) -> Option<SyncState> {
        if self.is_cancelled() {
            return None;
        }
        let start = Instant::now();
        let mut commit_rx = self.storage.subscribe_commits();
        let no_commit_interval = self.config.timeouts().block_sync_no_commit_interval;
        let timer = tokio::time::sleep(no_commit_interval);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                _ = self.cancel.changed() => {
                    return None;
                }
                _ = &mut timer => {
                    self.metrics.idle.state_latency.record(start.elapsed());
                    self.metrics.idle.times_expired.increment();
                    info!("no-commit timeout elapsed, starting block sync");
                    return Some(SyncState::CollectingAvailability);
                }
                changed = commit_rx.changed() => {
                    if changed.is_ok() {
                        self.metrics.idle.state_latency.record(start.elapsed());
                        self.metrics.idle.times_reset.increment();
                        return Some(SyncState::Idle);
                    }
                }
                message = self.inbound.recv() => {
                    // Idle declares no petitioner input of its own, but this node still
                    // answers other peers' availability/sync requests while idle so a
                    // lagging peer can make progress against it.
                    match message {
                        Some(message) => self.handle_source_request(&message).await,
                        None => return None,
                    }
                }
            }
        }
    }
}
