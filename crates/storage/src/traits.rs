use tn_types::{BlockHeight, BlockPair};
use tokio::sync::watch;

use crate::error::StorageError;

/// The block storage contract block-sync and the benchmark consensus core depend on.
///
/// This core owns the only implementation ([`crate::memory::InMemoryBlockStorage`]) since no
/// external collaborator supplies a durable one (see the Non-goals in §1): durability is
/// explicitly out of scope.
pub trait BlockStorage: Send + Sync {
    /// Returns the block pairs in `[first, last]` that are actually available, along with the
    /// first and last height that bound the returned (possibly empty, possibly truncated)
    /// range.
    fn get_blocks(
        &self,
        first: BlockHeight,
        last: BlockHeight,
    ) -> (Vec<BlockPair>, BlockHeight, BlockHeight);

    fn last_committed_block_height(&self) -> BlockHeight;

    /// Commits a block pair. The height must be exactly one greater than the current tip;
    /// height 0 is never committed (§4.3's tie-break rule).
    fn commit_block(&self, block_pair: BlockPair) -> Result<(), StorageError>;

    /// A receiver that is notified with the new tip height every time `commit_block` succeeds.
    /// Block-sync's Idle state subscribes to this to rearm its no-commit timer.
    fn subscribe_commits(&self) -> watch::Receiver<BlockHeight>;
}
