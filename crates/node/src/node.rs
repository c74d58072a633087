use std::{sync::Arc, time::Duration};

use consensus_metrics::MetricsFactory;
use futures::stream::{FuturesUnordered, StreamExt};
use tn_benchmark_consensus::BenchmarkConsensusCore;
use tn_block_sync::StateMetrics;
use tn_config::NodeConfig;
use tn_network::{GossipTransport, InMemoryTransport};
use tn_storage::{BlockStorage, InMemoryBlockStorage};
use tn_transaction_pool::{TransactionPool, VirtualMachine};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, instrument, warn};

use crate::error::NodeError;

struct NodeInner {
    config: NodeConfig,
    storage: Arc<dyn BlockStorage>,
    transport: Arc<dyn GossipTransport>,
    consensus: Arc<BenchmarkConsensusCore>,
    transaction_pool: Arc<TransactionPool>,
    handles: FuturesUnordered<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
    running: bool,
}

/// Wires together block storage, the gossip transport, the benchmark consensus core, the
/// block-sync state machine, and the transaction pool into one runnable node.
///
/// Mirrors the corpus's `Arc<RwLock<Inner>>` handle-holder pattern: cheap to clone, safe to
/// share across an embedder's own task tree.
#[derive(Clone)]
pub struct Node {
    internal: Arc<tokio::sync::RwLock<NodeInner>>,
}

impl Node {
    /// Builds a node around `config` and the embedder-supplied virtual machine. Storage and
    /// gossip transport are this core's in-memory implementations (§4.1, §4.2 Non-goals).
    pub fn new(config: NodeConfig, vm: Arc<dyn VirtualMachine>) -> Self {
        let storage: Arc<dyn BlockStorage> = Arc::new(InMemoryBlockStorage::new());
        let transport: Arc<dyn GossipTransport> =
            Arc::new(InMemoryTransport::new(config.node_public_key()));
        let consensus =
            Arc::new(BenchmarkConsensusCore::new(config.constant_consensus_leader(), storage.clone()));
        let transaction_pool = TransactionPool::new(config.clone(), vm, transport.clone());

        let inner = NodeInner {
            config,
            storage,
            transport,
            consensus,
            transaction_pool,
            handles: FuturesUnordered::new(),
            shutdown: None,
            running: false,
        };
        Self { internal: Arc::new(tokio::sync::RwLock::new(inner)) }
    }

    pub async fn transaction_pool(&self) -> Arc<TransactionPool> {
        self.internal.read().await.transaction_pool.clone()
    }

    pub async fn storage(&self) -> Arc<dyn BlockStorage> {
        self.internal.read().await.storage.clone()
    }

    pub async fn transport(&self) -> Arc<dyn GossipTransport> {
        self.internal.read().await.transport.clone()
    }

    pub async fn consensus(&self) -> Arc<BenchmarkConsensusCore> {
        self.internal.read().await.consensus.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.internal.read().await.running
    }

    /// Spawns the block-sync driver and the transaction pool's background tasks. Returns an
    /// error if the node is already running.
    #[instrument(name = "node", skip_all)]
    pub async fn start(&self) -> eyre::Result<()> {
        let mut inner = self.internal.write().await;
        if inner.running {
            return Err(NodeError::AlreadyRunning.into());
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics_factory = MetricsFactory::new();
        let state_metrics = Arc::new(StateMetrics::new(&metrics_factory));

        let mut handles = FuturesUnordered::new();
        handles.push(tn_block_sync::spawn_block_sync(
            inner.config.clone(),
            inner.storage.clone(),
            inner.transport.clone(),
            inner.consensus.clone(),
            state_metrics,
            shutdown_rx.clone(),
        ));
        handles.extend(tn_transaction_pool::spawn_transaction_pool_tasks(
            inner.transaction_pool.clone(),
            shutdown_rx.clone(),
        ));

        inner.handles = handles;
        inner.shutdown = Some(shutdown_tx);
        inner.running = true;
        info!("node started");
        Ok(())
    }

    /// Signals every background task to stop and waits up to `timeout` for them to finish.
    #[instrument(name = "node", skip_all)]
    pub async fn graceful_shutdown(&self, timeout: Duration) -> eyre::Result<()> {
        let mut inner = self.internal.write().await;
        let Some(shutdown) = inner.shutdown.take() else {
            return Err(NodeError::NotRunning.into());
        };
        let _ = shutdown.send(true);
        inner.running = false;

        let mut any_panicked = false;
        let drain = async {
            while let Some(result) = inner.handles.next().await {
                if let Err(e) = result {
                    warn!(error = %e, "a background task panicked during shutdown");
                    any_panicked = true;
                }
            }
        };

        match tokio::time::timeout(timeout, drain).await {
            Ok(()) if any_panicked => {
                Err(eyre::eyre!("one or more background tasks panicked during shutdown"))
            }
            Ok(()) => {
                info!("node shut down cleanly");
                Ok(())
            }
            Err(_) => {
                warn!("graceful shutdown timed out");
                Err(NodeError::ShutdownTimedOut.into())
            }
        }
    }
}
