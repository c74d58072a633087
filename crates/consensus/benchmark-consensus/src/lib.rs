//! Benchmark consensus: a constant-leader algorithm where the leader signs each block pair
//! and followers verify that signature plus the block's linkage to the prior committed
//! block, before updating their view of "last committed."

mod error;

use std::sync::Arc;

pub use error::ConsensusError;
use tn_storage::{BlockStorage, StorageError};
use tn_types::{xor, BlockPair, BlockType, KeyPair, PublicKey};

/// How a caller wants an incoming block pair handled. Mirrors the three-way split the
/// original handler exposes so a caller can verify without committing to a view (e.g. when
/// double-checking someone else's proposal) or update its view without re-verifying a block
/// it already trusts (e.g. immediately after signing as leader).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HandleBlockConsensusMode {
    VerifyOnly,
    UpdateOnly,
    VerifyAndUpdate,
}

/// `ceil(network_size * quorum_percentage / 100)`, computed in floating point so that, for
/// example, a 66% quorum of 4 nodes yields 3, not 2.
pub fn required_quorum_size(network_size: u32, quorum_percentage: u32) -> u32 {
    (network_size as f64 * quorum_percentage as f64 / 100.0).ceil() as u32
}

/// The bytes a leader signs (and a follower verifies) to prove consensus on one block pair:
/// the XOR of the transactions-block hash and the results-block hash.
pub fn signed_data_for_block_proof(block_pair: &BlockPair) -> [u8; 32] {
    let tx_hash = block_pair.transactions_block.hash();
    let rx_hash = block_pair.results_block.hash();
    xor(&tx_hash, &rx_hash)
}

/// Verifies that `block_pair` carries a valid benchmark-consensus proof from `leader` and,
/// if `prev_committed` is given, that it links correctly onto it.
pub fn validate_block_consensus(
    block_pair: &BlockPair,
    prev_committed: Option<&BlockPair>,
    leader: PublicKey,
) -> Result<(), ConsensusError> {
    if !block_pair.transactions_block.proof.is_benchmark_consensus() {
        return Err(ConsensusError::IncorrectProofType);
    }
    if !block_pair.results_block.proof.is_benchmark_consensus() {
        return Err(ConsensusError::IncorrectProofType);
    }

    if let Some(prev) = prev_committed {
        let prev_tx_hash = prev.transactions_block.hash();
        if block_pair.transactions_block.header.prev_block_hash_ptr != prev_tx_hash {
            return Err(ConsensusError::TransactionsPrevHashMismatch);
        }
        let prev_rx_hash = prev.results_block.hash();
        if block_pair.results_block.header.prev_block_hash_ptr != prev_rx_hash {
            return Err(ConsensusError::ResultsPrevHashMismatch);
        }
    }

    let block_proof = &block_pair.results_block.proof;
    if block_proof.sender.public_key != leader {
        return Err(ConsensusError::NotFromLeader);
    }
    let signed_data = signed_data_for_block_proof(block_pair);
    if !tn_types::verify_signature(&block_proof.sender.public_key, &signed_data, &block_proof.sender.signature) {
        return Err(ConsensusError::InvalidSignature);
    }

    Ok(())
}

/// As the configured leader, attaches a benchmark-consensus proof to both sub-blocks of
/// `block_pair`. Both proofs carry the same signature, since the signed payload already
/// binds the two sub-blocks together via their hashes.
pub fn sign_block_pair(leader_key: &KeyPair, mut block_pair: BlockPair) -> BlockPair {
    let signed_data = signed_data_for_block_proof(&block_pair);
    let signature = leader_key.sign(&signed_data);
    let proof = tn_types::BlockProof {
        proof_type: tn_types::BlockProofType::BenchmarkConsensus,
        sender: tn_types::SenderSignature { public_key: leader_key.public_key(), signature },
    };
    block_pair.transactions_block.proof = proof;
    block_pair.results_block.proof = proof;
    block_pair
}

/// The node's current view of "last committed," updated under a compare-and-set so that two
/// concurrent updaters can't silently clobber each other's work.
#[derive(Default)]
struct LastCommittedBlock {
    current: parking_lot::Mutex<Option<Arc<BlockPair>>>,
}

impl LastCommittedBlock {
    fn get(&self) -> Option<Arc<BlockPair>> {
        self.current.lock().clone()
    }

    /// Swaps in `new` only if the current value is still (pointer-)identical to `expected`.
    fn try_set(
        &self,
        new: Arc<BlockPair>,
        expected: Option<Arc<BlockPair>>,
    ) -> Result<(), ConsensusError> {
        let mut current = self.current.lock();
        let matches = match (&*current, &expected) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        if !matches {
            return Err(ConsensusError::ConcurrentCommitConflict);
        }
        *current = Some(new);
        Ok(())
    }
}

/// Wires together validation, the CAS-guarded last-committed view, and the block storage
/// this core hands committed blocks to.
pub struct BenchmarkConsensusCore {
    leader: PublicKey,
    storage: Arc<dyn BlockStorage>,
    last_committed: LastCommittedBlock,
}

impl BenchmarkConsensusCore {
    pub fn new(leader: PublicKey, storage: Arc<dyn BlockStorage>) -> Self {
        Self { leader, storage, last_committed: LastCommittedBlock::default() }
    }

    pub fn last_committed_block(&self) -> Option<Arc<BlockPair>> {
        self.last_committed.get()
    }

    /// Handles one incoming block pair per `mode`. Height 0 is never committed to storage,
    /// matching block-sync's own tie-break rule.
    pub fn handle_block_consensus(
        &self,
        mode: HandleBlockConsensusMode,
        block_type: BlockType,
        block_pair: BlockPair,
    ) -> Result<(), ConsensusError> {
        if !matches!(block_type, BlockType::BlockPair) {
            return Err(ConsensusError::UnsupportedBlockType);
        }

        if matches!(mode, HandleBlockConsensusMode::VerifyOnly | HandleBlockConsensusMode::VerifyAndUpdate)
        {
            let prev = self.last_committed.get();
            validate_block_consensus(&block_pair, prev.as_deref(), self.leader)?;
        }

        if matches!(mode, HandleBlockConsensusMode::UpdateOnly | HandleBlockConsensusMode::VerifyAndUpdate)
        {
            let prev = self.last_committed.get();
            let prev_height = prev.as_ref().map(|b| b.block_height()).unwrap_or_default();
            if block_pair.block_height() > prev_height {
                self.last_committed.try_set(Arc::new(block_pair), prev)?;
            }
        }

        Ok(())
    }

    /// Commits `block_pair` to storage unless its height is 0, mirroring the original's
    /// no-op on the genesis placeholder.
    pub fn save_to_storage(&self, block_pair: &BlockPair) -> Result<(), StorageError> {
        if block_pair.block_height().is_none() {
            return Ok(());
        }
        self.storage.commit_block(block_pair.clone())
    }
}
