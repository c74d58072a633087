mod collecting;
mod finished_car;
mod idle;
mod processing;
mod waiting;

use std::sync::Arc;

use tn_benchmark_consensus::BenchmarkConsensusCore;
use tn_config::NodeConfig;
use tn_network::{BlockAvailabilityResponse, BlockSyncResponse, GossipMessage, GossipTransport};
use tn_storage::BlockStorage;
use tn_types::PublicKey;
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::metrics::StateMetrics;

/// One state of the block-sync state machine, carrying exactly the data the next transition
/// needs. A fresh `Idle` value is created on every re-entry (rather than looping in place)
/// so its no-commit timer always starts from zero.
pub enum SyncState {
    Idle,
    CollectingAvailability,
    FinishedCAR(Vec<BlockAvailabilityResponse>),
    WaitingForChunks(PublicKey),
    Processing(BlockSyncResponse),
}

/// Shared collaborators plus the single-consumer inbound channel and cancellation signal
/// driving one block-sync state machine instance.
pub struct Driver {
    pub(crate) config: NodeConfig,
    pub(crate) storage: Arc<dyn BlockStorage>,
    pub(crate) transport: Arc<dyn GossipTransport>,
    pub(crate) consensus: Arc<BenchmarkConsensusCore>,
    pub(crate) metrics: Arc<StateMetrics>,
    pub(crate) inbound: mpsc::Receiver<GossipMessage>,
    pub(crate) cancel: watch::Receiver<bool>,
}

impl Driver {
    pub fn new(
        config: NodeConfig,
        storage: Arc<dyn BlockStorage>,
        transport: Arc<dyn GossipTransport>,
        consensus: Arc<BenchmarkConsensusCore>,
        metrics: Arc<StateMetrics>,
        inbound: mpsc::Receiver<GossipMessage>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self { config, storage, transport, consensus, metrics, inbound, cancel }
    }

    /// Returns `true` once, and only once, cancellation has been signalled.
    pub(crate) fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Runs the state machine until cancellation. Every state transition is logged at
    /// `info` so a lagging node's recovery is visible without attaching a debugger.
    pub async fn run(mut self) {
        let mut state = Some(SyncState::Idle);
        while let Some(current) = state {
            state = match current {
                SyncState::Idle => self.process_idle().await,
                SyncState::CollectingAvailability => self.process_collecting().await,
                SyncState::FinishedCAR(responses) => self.process_finished_car(responses).await,
                SyncState::WaitingForChunks(source) => self.process_waiting(source).await,
                SyncState::Processing(response) => self.process_processing(response).await,
            };
        }
        info!("block-sync state machine terminated");
    }
}
