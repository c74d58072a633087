//! The block synchronization state machine (§4.3): `Idle → CollectingAvailability →
//! FinishedCAR → WaitingForChunks → Processing → Idle`.

mod conduit;
mod error;
mod metrics;
mod source;
mod states;

use std::sync::Arc;

pub use conduit::{new_conduit, CONDUIT_CAPACITY};
pub use error::BlockSyncError;
pub use metrics::StateMetrics;
pub use states::{Driver, SyncState};
use tn_benchmark_consensus::BenchmarkConsensusCore;
use tn_config::NodeConfig;
use tn_network::GossipTransport;
use tn_storage::BlockStorage;
use tokio::{sync::watch, task::JoinHandle};

/// Builds a [`Driver`], registers it as the transport's gossip handler, and spawns its
/// driving loop. Returns the task handle so a `TaskManager` can await it on shutdown.
pub fn spawn_block_sync(
    config: NodeConfig,
    storage: Arc<dyn BlockStorage>,
    transport: Arc<dyn GossipTransport>,
    consensus: Arc<BenchmarkConsensusCore>,
    metrics: Arc<StateMetrics>,
    cancel: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let (sender, receiver) = new_conduit();
    transport.register_sync_handler(sender);
    let driver = Driver::new(config, storage, transport, consensus, metrics, receiver, cancel);
    tokio::spawn(driver.run())
}
