//! Wire messages exchanged over the gossip transport (§4.2).

use serde::{Deserialize, Serialize};
use tn_types::{BlockHeight, BlockPair, BlockType, PublicKey, SignedTransaction};

/// A signed range of block heights, carried by both availability and chunk messages.
///
/// `sender` identifies the node claiming this range; the sync-path transport does not
/// itself verify the accompanying signature, since block content is validated at commit
/// time by consensus, not at the transport layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedBatchRange {
    pub block_type: BlockType,
    pub first_height: BlockHeight,
    pub last_height: BlockHeight,
    pub last_committed_height: BlockHeight,
    pub sender: PublicKey,
}

/// Broadcast by a lagging node asking who has blocks beyond its own tip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockAvailabilityRequest {
    pub signed_batch_range: SignedBatchRange,
}

/// Sent by a peer in response to a [`BlockAvailabilityRequest`] it can usefully answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockAvailabilityResponse {
    pub signed_batch_range: SignedBatchRange,
}

/// Unicast to a chosen source, asking for the actual block pairs in a range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockSyncRequest {
    pub signed_chunk_range: SignedBatchRange,
}

/// A source's answer to a [`BlockSyncRequest`], carrying the block pairs themselves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockSyncResponse {
    pub signed_chunk_range: SignedBatchRange,
    pub block_pairs: Vec<BlockPair>,
}

/// Broadcast relay of admitted transactions, drained from the pending pool's forward
/// queue (§4.4).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForwardedTransactions {
    pub signed_transactions: Vec<SignedTransaction>,
}

/// The union of messages this core sends and receives over gossip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GossipMessage {
    BlockAvailabilityRequest(BlockAvailabilityRequest),
    BlockAvailabilityResponse(BlockAvailabilityResponse),
    BlockSyncRequest(BlockSyncRequest),
    BlockSyncResponse(BlockSyncResponse),
    ForwardedTransactions(ForwardedTransactions),
}
