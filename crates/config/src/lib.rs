//! The node's configuration snapshot: an immutable, typed lookup of tunables and
//! federation membership, built once at startup.
//!
//! This mirrors the original hard-coded configuration's string-keyed getters
//! (`BLOCK_SYNC_BATCH_SIZE`, `TRANSACTION_POOL_PENDING_POOL_SIZE_IN_BYTES`, ...) but as typed
//! struct fields: reads never block and there is nothing left to parse at call time.

mod error;

use std::{collections::BTreeMap, sync::Arc, time::Duration};

pub use error::ConfigError;
use tn_types::{ConsensusAlgoType, FederationNode, GossipPeer, KeyPair, PublicKey, VirtualChainId};

/// Durations and counts taken verbatim from the original configuration keys (§6).
#[derive(Clone, Debug)]
pub struct Timeouts {
    pub benchmark_consensus_retry_interval: Duration,
    pub lean_helix_consensus_retry_interval: Duration,

    pub block_sync_batch_size: u32,
    pub block_sync_no_commit_interval: Duration,
    pub block_sync_collect_response_timeout: Duration,
    pub block_sync_collect_chunks_timeout: Duration,

    pub block_transaction_receipt_query_grace_start: Duration,
    pub block_transaction_receipt_query_grace_end: Duration,
    pub block_transaction_receipt_query_expiration_window: Duration,

    pub consensus_context_minimal_block_time: Duration,
    pub consensus_context_minimum_transactions_in_block: u32,
    pub consensus_context_maximum_transactions_in_block: u32,

    pub state_storage_history_snapshot_num: u32,

    pub block_tracker_grace_distance: u32,
    pub block_tracker_grace_timeout: Duration,

    pub transaction_pool_pending_pool_size_in_bytes: u32,
    pub transaction_pool_transaction_expiration_window: Duration,
    pub transaction_pool_future_timestamp_grace_timeout: Duration,
    pub transaction_pool_pending_pool_clear_expired_interval: Duration,
    pub transaction_pool_committed_pool_clear_expired_interval: Duration,
    pub transaction_pool_propagation_batch_size: u16,
    pub transaction_pool_propagation_batching_timeout: Duration,

    pub gossip_listen_port: u16,
    pub gossip_connection_keep_alive_interval: Duration,
    pub gossip_network_timeout: Duration,

    pub public_api_send_transaction_timeout: Duration,

    pub metrics_report_interval: Duration,
}

impl Default for Timeouts {
    /// Defaults roughly matching the original hard-coded development configuration; every
    /// field is expected to be overridden by the embedder in production and shortened by
    /// test harnesses.
    fn default() -> Self {
        Self {
            benchmark_consensus_retry_interval: Duration::from_millis(300),
            lean_helix_consensus_retry_interval: Duration::from_millis(300),

            block_sync_batch_size: 10,
            block_sync_no_commit_interval: Duration::from_secs(3),
            block_sync_collect_response_timeout: Duration::from_secs(5),
            block_sync_collect_chunks_timeout: Duration::from_secs(5),

            block_transaction_receipt_query_grace_start: Duration::from_secs(2),
            block_transaction_receipt_query_grace_end: Duration::from_secs(2),
            block_transaction_receipt_query_expiration_window: Duration::from_secs(30 * 60),

            consensus_context_minimal_block_time: Duration::from_millis(300),
            consensus_context_minimum_transactions_in_block: 0,
            consensus_context_maximum_transactions_in_block: 100,

            state_storage_history_snapshot_num: 5,

            block_tracker_grace_distance: 3,
            block_tracker_grace_timeout: Duration::from_secs(5),

            transaction_pool_pending_pool_size_in_bytes: 20 * 1024 * 1024,
            transaction_pool_transaction_expiration_window: Duration::from_secs(30 * 60),
            transaction_pool_future_timestamp_grace_timeout: Duration::from_secs(3),
            transaction_pool_pending_pool_clear_expired_interval: Duration::from_secs(10),
            transaction_pool_committed_pool_clear_expired_interval: Duration::from_secs(30),
            transaction_pool_propagation_batch_size: 10,
            transaction_pool_propagation_batching_timeout: Duration::from_millis(500),

            gossip_listen_port: 4400,
            gossip_connection_keep_alive_interval: Duration::from_secs(3),
            gossip_network_timeout: Duration::from_secs(5),

            public_api_send_transaction_timeout: Duration::from_secs(5),

            metrics_report_interval: Duration::from_secs(30),
        }
    }
}

struct NodeConfigInner {
    node_key: KeyPair,
    federation_nodes: BTreeMap<String, FederationNode>,
    gossip_peers: BTreeMap<String, GossipPeer>,
    constant_consensus_leader: PublicKey,
    active_consensus_algo: ConsensusAlgoType,
    required_quorum_percentage: u32,
    virtual_chain_id: VirtualChainId,
    timeouts: Timeouts,
}

/// A cheaply-cloneable, read-only snapshot of this node's configuration. Constructed once at
/// startup by [`NodeConfigBuilder::build`]; the core never mutates it afterwards.
#[derive(Clone)]
pub struct NodeConfig {
    inner: Arc<NodeConfigInner>,
}

impl NodeConfig {
    pub fn node_public_key(&self) -> PublicKey {
        self.inner.node_key.public_key()
    }

    pub fn node_key_pair(&self) -> &KeyPair {
        &self.inner.node_key
    }

    pub fn federation_nodes(&self) -> &BTreeMap<String, FederationNode> {
        &self.inner.federation_nodes
    }

    pub fn gossip_peers(&self) -> &BTreeMap<String, GossipPeer> {
        &self.inner.gossip_peers
    }

    /// The number of federation members. The original signature takes an `as_of_block`
    /// parameter for a future where membership could change over time; this core's
    /// membership is fixed per snapshot, so the parameter is accepted and ignored.
    pub fn network_size(&self, _as_of_block: u64) -> u32 {
        self.inner.federation_nodes.len() as u32
    }

    pub fn constant_consensus_leader(&self) -> PublicKey {
        self.inner.constant_consensus_leader
    }

    pub fn active_consensus_algo(&self) -> ConsensusAlgoType {
        self.inner.active_consensus_algo
    }

    pub fn consensus_required_quorum_percentage(&self) -> u32 {
        self.inner.required_quorum_percentage
    }

    pub fn virtual_chain_id(&self) -> VirtualChainId {
        self.inner.virtual_chain_id
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.inner.timeouts
    }
}

/// Builds a [`NodeConfig`], mirroring the original's `mutableNodeConfig` setters
/// (`SetNodePublicKey`, `SetFederationNodes`, `SetActiveConsensusAlgo`, ...).
#[derive(Default)]
pub struct NodeConfigBuilder {
    node_key: Option<KeyPair>,
    federation_nodes: BTreeMap<String, FederationNode>,
    gossip_peers: BTreeMap<String, GossipPeer>,
    constant_consensus_leader: Option<PublicKey>,
    active_consensus_algo: ConsensusAlgoType,
    required_quorum_percentage: u32,
    virtual_chain_id: VirtualChainId,
    timeouts: Timeouts,
}

impl NodeConfigBuilder {
    pub fn new() -> Self {
        Self { timeouts: Timeouts::default(), ..Default::default() }
    }

    pub fn node_key_pair(mut self, key: KeyPair) -> Self {
        self.node_key = Some(key);
        self
    }

    pub fn add_federation_node(mut self, node: FederationNode) -> Self {
        self.federation_nodes.insert(node.public_key.to_hex(), node);
        self
    }

    pub fn federation_nodes(mut self, nodes: impl IntoIterator<Item = FederationNode>) -> Self {
        for node in nodes {
            self = self.add_federation_node(node);
        }
        self
    }

    pub fn add_gossip_peer(mut self, public_key: PublicKey, peer: GossipPeer) -> Self {
        self.gossip_peers.insert(public_key.to_hex(), peer);
        self
    }

    pub fn constant_consensus_leader(mut self, leader: PublicKey) -> Self {
        self.constant_consensus_leader = Some(leader);
        self
    }

    pub fn active_consensus_algo(mut self, algo: ConsensusAlgoType) -> Self {
        self.active_consensus_algo = algo;
        self
    }

    pub fn consensus_required_quorum_percentage(mut self, pct: u32) -> Self {
        self.required_quorum_percentage = pct;
        self
    }

    pub fn virtual_chain_id(mut self, id: u32) -> Self {
        self.virtual_chain_id = VirtualChainId(id);
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn build(self) -> Result<NodeConfig, ConfigError> {
        if self.required_quorum_percentage == 0 || self.required_quorum_percentage > 100 {
            return Err(ConfigError::QuorumPercentageOutOfRange(self.required_quorum_percentage));
        }
        if self.federation_nodes.is_empty() {
            return Err(ConfigError::EmptyFederation);
        }
        let node_key = self.node_key.ok_or(ConfigError::MissingNodeKeyPair)?;
        let constant_consensus_leader =
            self.constant_consensus_leader.unwrap_or_else(|| node_key.public_key());

        Ok(NodeConfig {
            inner: Arc::new(NodeConfigInner {
                node_key,
                federation_nodes: self.federation_nodes,
                gossip_peers: self.gossip_peers,
                constant_consensus_leader,
                active_consensus_algo: self.active_consensus_algo,
                required_quorum_percentage: self.required_quorum_percentage,
                virtual_chain_id: self.virtual_chain_id,
                timeouts: self.timeouts,
            }),
        })
    }
}
