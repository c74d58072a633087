use parking_lot::Mutex;
use tn_types::{BlockHeight, BlockPair};
use tokio::sync::watch;
use tracing::debug;

use crate::{error::StorageError, traits::BlockStorage};

/// An in-memory, non-durable implementation of [`BlockStorage`].
///
/// Blocks are appended to a plain `Vec`, indexed by `height - 1`; there is no persistence
/// across process restarts, matching the stated Non-goal.
pub struct InMemoryBlockStorage {
    blocks: Mutex<Vec<BlockPair>>,
    commit_tx: watch::Sender<BlockHeight>,
}

impl InMemoryBlockStorage {
    pub fn new() -> Self {
        let (commit_tx, _rx) = watch::channel(BlockHeight::NONE);
        Self { blocks: Mutex::new(Vec::new()), commit_tx }
    }
}

impl Default for InMemoryBlockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStorage for InMemoryBlockStorage {
    fn get_blocks(
        &self,
        first: BlockHeight,
        last: BlockHeight,
    ) -> (Vec<BlockPair>, BlockHeight, BlockHeight) {
        let blocks = self.blocks.lock();
        if blocks.is_empty() || first.is_none() || first > last {
            return (Vec::new(), BlockHeight::NONE, BlockHeight::NONE);
        }
        let last_available = BlockHeight(blocks.len() as u64);
        let first_idx = (first.0 - 1) as usize;
        if first_idx >= blocks.len() {
            return (Vec::new(), BlockHeight::NONE, last_available);
        }
        let last_idx = (last.0 as usize).min(blocks.len());
        let slice = &blocks[first_idx..last_idx];
        (slice.to_vec(), first, BlockHeight(last_idx as u64))
    }

    fn last_committed_block_height(&self) -> BlockHeight {
        BlockHeight(self.blocks.lock().len() as u64)
    }

    fn commit_block(&self, block_pair: BlockPair) -> Result<(), StorageError> {
        let height = block_pair.block_height();
        if height.is_none() {
            return Err(StorageError::ZeroHeightCommit(height));
        }
        let mut blocks = self.blocks.lock();
        let expected = BlockHeight(blocks.len() as u64 + 1);
        if height != expected {
            return Err(StorageError::NonContiguousHeight { expected, got: height });
        }
        blocks.push(block_pair);
        debug!(height = %height, "committed block");
        // Ignore send errors: no subscriber is not a failure for the committer.
        let _ = self.commit_tx.send(height);
        Ok(())
    }

    fn subscribe_commits(&self) -> watch::Receiver<BlockHeight> {
        self.commit_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tn_types::{
        BlockHeader, BlockProof, BlockProofType, Hash, KeyPair, ResultsBlock, SenderSignature,
        TransactionsBlock,
    };

    fn block_pair_at(height: u64, prev: Hash) -> BlockPair {
        let key = KeyPair::from_seed([7u8; 32]);
        let header = BlockHeader {
            block_height: BlockHeight(height),
            prev_block_hash_ptr: prev,
            timestamp: height as i64,
        };
        let proof = BlockProof {
            proof_type: BlockProofType::BenchmarkConsensus,
            sender: SenderSignature { public_key: key.public_key(), signature: key.sign(b"x") },
        };
        BlockPair {
            transactions_block: TransactionsBlock {
                header,
                proof,
                transactions: Vec::new(),
            },
            results_block: ResultsBlock { header, proof, receipts: Vec::new() },
        }
    }

    #[test]
    fn commits_must_be_contiguous() {
        let storage = InMemoryBlockStorage::new();
        assert_eq!(storage.last_committed_block_height(), BlockHeight::NONE);

        storage.commit_block(block_pair_at(1, Hash::ZERO)).expect("first commit");
        assert_eq!(storage.last_committed_block_height(), BlockHeight(1));

        let err = storage.commit_block(block_pair_at(3, Hash::ZERO)).unwrap_err();
        assert_eq!(
            err,
            StorageError::NonContiguousHeight { expected: BlockHeight(2), got: BlockHeight(3) }
        );
    }

    #[test]
    fn height_zero_is_never_committed() {
        let storage = InMemoryBlockStorage::new();
        let err = storage.commit_block(block_pair_at(0, Hash::ZERO)).unwrap_err();
        assert_eq!(err, StorageError::ZeroHeightCommit(BlockHeight::NONE));
    }

    #[test]
    fn get_blocks_caps_to_available_range() {
        let storage = InMemoryBlockStorage::new();
        for h in 1..=5u64 {
            storage.commit_block(block_pair_at(h, Hash::ZERO)).unwrap();
        }
        let (blocks, first, last) = storage.get_blocks(BlockHeight(3), BlockHeight(100));
        assert_eq!(first, BlockHeight(3));
        assert_eq!(last, BlockHeight(5));
        assert_eq!(blocks.len(), 3);
    }

    #[tokio::test]
    async fn commit_notifies_subscribers() {
        let storage = InMemoryBlockStorage::new();
        let mut rx = storage.subscribe_commits();
        storage.commit_block(block_pair_at(1, Hash::ZERO)).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), BlockHeight(1));
    }
}
