use std::time::Duration;

use tn_types::BlockHeight;
use tokio::sync::watch;

use crate::error::PoolError;

/// Tracks the node's committed height and lets callers wait for a target height to arrive,
/// subject to a grace distance (reject immediately if the target is implausibly far ahead)
/// and a grace timeout (give up waiting after a bounded time).
pub struct BlockTracker {
    height: watch::Sender<BlockHeight>,
    grace_distance: u32,
    grace_timeout: Duration,
}

impl BlockTracker {
    pub fn new(initial: BlockHeight, grace_distance: u32, grace_timeout: Duration) -> Self {
        let (height, _rx) = watch::channel(initial);
        Self { height, grace_distance, grace_timeout }
    }

    pub fn current_height(&self) -> BlockHeight {
        *self.height.borrow()
    }

    /// Advances the tracked height. A no-op if `height` does not exceed the current value.
    pub fn advance(&self, height: BlockHeight) {
        self.height.send_if_modified(|current| {
            if height > *current {
                *current = height;
                true
            } else {
                false
            }
        });
    }

    /// Waits until the tracked height reaches `target`.
    pub async fn wait_for_block(&self, target: BlockHeight) -> Result<(), PoolError> {
        let mut rx = self.height.subscribe();
        let current = *rx.borrow();
        if current >= target {
            return Ok(());
        }
        if target - current > self.grace_distance as i64 {
            return Err(PoolError::TooFarAhead { target, current });
        }

        let deadline = tokio::time::sleep(self.grace_timeout);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    changed.map_err(|_| PoolError::Timeout)?;
                    if *rx.borrow() >= target {
                        return Ok(());
                    }
                }
                _ = &mut deadline => {
                    return Err(PoolError::Timeout);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_immediately_when_already_at_target() {
        let tracker = BlockTracker::new(BlockHeight(5), 3, Duration::from_millis(50));
        tracker.wait_for_block(BlockHeight(5)).await.expect("already there");
    }

    #[tokio::test]
    async fn rejects_targets_beyond_grace_distance() {
        let tracker = BlockTracker::new(BlockHeight(0), 2, Duration::from_millis(50));
        let err = tracker.wait_for_block(BlockHeight(10)).await.unwrap_err();
        assert!(matches!(err, PoolError::TooFarAhead { .. }));
    }

    #[tokio::test]
    async fn wakes_up_once_height_advances_past_target() {
        let tracker = std::sync::Arc::new(BlockTracker::new(
            BlockHeight(0),
            5,
            Duration::from_millis(200),
        ));
        let waiter = tracker.clone();
        let handle = tokio::spawn(async move { waiter.wait_for_block(BlockHeight(3)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        tracker.advance(BlockHeight(3));
        handle.await.expect("task joined").expect("resolved before timeout");
    }

    #[tokio::test]
    async fn times_out_if_height_never_arrives() {
        let tracker = BlockTracker::new(BlockHeight(0), 5, Duration::from_millis(20));
        let err = tracker.wait_for_block(BlockHeight(3)).await.unwrap_err();
        assert!(matches!(err, PoolError::Timeout));
    }
}
