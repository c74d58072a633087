use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tn_network::{ForwardedTransactions, GossipMessage, GossipTransport};
use tn_types::SignedTransaction;
use tokio::sync::watch;
use tracing::{debug, warn};

/// A mutex-guarded staging area for transactions awaiting propagation. Coalesces admissions
/// from any number of producers; the batcher task is the sole drainer.
pub struct ForwardQueue {
    queue: Mutex<Vec<SignedTransaction>>,
}

impl ForwardQueue {
    pub fn new() -> Self {
        Self { queue: Mutex::new(Vec::new()) }
    }

    pub fn push(&self, signed_tx: SignedTransaction) {
        self.queue.lock().push(signed_tx);
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    fn drain(&self) -> Vec<SignedTransaction> {
        std::mem::take(&mut *self.queue.lock())
    }
}

impl Default for ForwardQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains `queue` every `batching_timeout`, or sooner once it holds `batch_size` items,
/// broadcasting one `ForwardedTransactions` message per drain. Polls at a fraction of the
/// batching timeout to notice a full queue promptly without a dedicated wakeup primitive.
pub async fn run_forwarding_batcher(
    queue: Arc<ForwardQueue>,
    transport: Arc<dyn GossipTransport>,
    batch_size: u16,
    batching_timeout: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    let poll_interval = (batching_timeout / 10).max(Duration::from_millis(5));
    let mut last_flush = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(poll_interval) => {
                let timed_out = last_flush.elapsed() >= batching_timeout;
                let len = queue.len();
                if len == 0 {
                    continue;
                }
                if len >= batch_size as usize || timed_out {
                    let batch = queue.drain();
                    last_flush = tokio::time::Instant::now();
                    if batch.is_empty() {
                        continue;
                    }
                    let count = batch.len();
                    let message = GossipMessage::ForwardedTransactions(ForwardedTransactions {
                        signed_transactions: batch,
                    });
                    match transport.broadcast(message).await {
                        Ok(()) => debug!(count, "forwarded batched transactions"),
                        Err(e) => warn!(error = %e, count, "failed to broadcast forwarded transactions"),
                    }
                }
            }
        }
    }
}
