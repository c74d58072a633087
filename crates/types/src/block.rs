//! Block pairs: the unit committed atomically by consensus.

use serde::{Deserialize, Serialize};

use crate::{
    hash::{hash_bytes, Hash},
    keys::PublicKey,
    transaction::{SignedTransaction, TimestampNano, TransactionReceipt},
};

/// Monotonic 1-based block height. 0 denotes "none committed yet".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    pub const NONE: BlockHeight = BlockHeight(0);

    pub fn next(self) -> Self {
        BlockHeight(self.0 + 1)
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add<u64> for BlockHeight {
    type Output = BlockHeight;
    fn add(self, rhs: u64) -> BlockHeight {
        BlockHeight(self.0 + rhs)
    }
}

impl std::ops::Sub<BlockHeight> for BlockHeight {
    type Output = i64;
    fn sub(self, rhs: BlockHeight) -> i64 {
        self.0 as i64 - rhs.0 as i64
    }
}

/// The only block type this core supports; carried on the wire so the protocol can grow
/// additional block types without breaking existing messages.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BlockType {
    BlockPair,
}

/// Which consensus algorithm produced (and must validate) a block proof.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ConsensusAlgoType {
    BenchmarkConsensus,
    LeanHelix,
}

impl Default for ConsensusAlgoType {
    fn default() -> Self {
        ConsensusAlgoType::BenchmarkConsensus
    }
}

/// The type tag carried on a block proof; mirrors [`ConsensusAlgoType`] but is a distinct
/// type because a node could in principle validate proofs from an algorithm it does not
/// itself run as leader.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BlockProofType {
    BenchmarkConsensus,
    LeanHelix,
}

/// A public key plus an (optional) signature attesting to some signed content.
///
/// The signature is optional because a request message (e.g. `BlockAvailabilityRequest`)
/// only needs to identify its sender; only a block proof's signature is ever verified.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SenderSignature {
    pub public_key: PublicKey,
    pub signature: crate::keys::Signature,
}

/// The proof attached to a sub-block attesting that consensus was reached on it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BlockProof {
    pub proof_type: BlockProofType,
    pub sender: SenderSignature,
}

impl BlockProof {
    pub fn is_benchmark_consensus(&self) -> bool {
        matches!(self.proof_type, BlockProofType::BenchmarkConsensus)
    }
}

/// Header shared by both sub-blocks of a block pair.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_height: BlockHeight,
    pub prev_block_hash_ptr: Hash,
    pub timestamp: TimestampNano,
}

/// The transactions sub-block: the ordered set of transactions agreed upon for this height.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TransactionsBlock {
    pub header: BlockHeader,
    pub proof: BlockProof,
    pub transactions: Vec<SignedTransaction>,
}

impl TransactionsBlock {
    /// Digest used both as this block's identity and as the next block's
    /// `prev_block_hash_ptr`.
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.header.block_height.0.to_le_bytes());
        buf.extend_from_slice(self.header.prev_block_hash_ptr.as_bytes());
        buf.extend_from_slice(&self.header.timestamp.to_le_bytes());
        for tx in &self.transactions {
            buf.extend_from_slice(tx.tx_hash().as_bytes());
        }
        hash_bytes(&buf)
    }
}

/// The results sub-block: the receipts produced by executing the paired transactions block.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ResultsBlock {
    pub header: BlockHeader,
    pub proof: BlockProof,
    pub receipts: Vec<TransactionReceipt>,
}

impl ResultsBlock {
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.header.block_height.0.to_le_bytes());
        buf.extend_from_slice(self.header.prev_block_hash_ptr.as_bytes());
        buf.extend_from_slice(&self.header.timestamp.to_le_bytes());
        for receipt in &self.receipts {
            buf.extend_from_slice(receipt.tx_hash.as_bytes());
            buf.push(receipt.success as u8);
        }
        hash_bytes(&buf)
    }
}

/// The two linked sub-blocks committed atomically at one height.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BlockPair {
    pub transactions_block: TransactionsBlock,
    pub results_block: ResultsBlock,
}

impl BlockPair {
    pub fn block_height(&self) -> BlockHeight {
        self.transactions_block.header.block_height
    }

    pub fn timestamp(&self) -> TimestampNano {
        self.transactions_block.header.timestamp
    }
}

/// A federation member, keyed by its public key.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FederationNode {
    pub public_key: PublicKey,
}

/// A peer reachable over the gossip transport.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GossipPeer {
    pub endpoint: String,
    pub port: u16,
}
