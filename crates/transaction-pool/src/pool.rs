use std::sync::Arc;

use parking_lot::RwLock;
use tn_config::NodeConfig;
use tn_network::{ForwardedTransactions, GossipMessage, GossipTransport};
use tn_types::{
    BlockHeight, Hash, PreOrderStatus, RejectionReason, SignedTransaction, TimestampNano,
    TransactionReceipt, TransactionStatus,
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    block_tracker::BlockTracker,
    committed_pool::CommittedPool,
    error::PoolError,
    forward_queue::{run_forwarding_batcher, ForwardQueue},
    pending_pool::PendingPool,
    validation_context::ValidationContext,
    vm::VirtualMachine,
};

struct LastCommitted {
    height: BlockHeight,
    timestamp: TimestampNano,
}

/// The node's transaction pool: admission, committed-receipt lookups, pre-order validation
/// for block proposal, and propagation to peers.
pub struct TransactionPool {
    config: NodeConfig,
    pending: PendingPool,
    committed: CommittedPool,
    block_tracker: BlockTracker,
    forward_queue: Arc<ForwardQueue>,
    vm: Arc<dyn VirtualMachine>,
    transport: Arc<dyn GossipTransport>,
    last_committed: RwLock<LastCommitted>,
    results_handler: RwLock<Option<Arc<dyn Fn(Hash, RejectionReason) + Send + Sync>>>,
}

impl TransactionPool {
    pub fn new(
        config: NodeConfig,
        vm: Arc<dyn VirtualMachine>,
        transport: Arc<dyn GossipTransport>,
    ) -> Arc<Self> {
        let timeouts = config.timeouts();
        let pending = PendingPool::new(timeouts.transaction_pool_pending_pool_size_in_bytes as usize);
        let block_tracker = BlockTracker::new(
            BlockHeight::NONE,
            timeouts.block_tracker_grace_distance,
            timeouts.block_tracker_grace_timeout,
        );

        let pool = Arc::new(Self {
            config,
            pending,
            committed: CommittedPool::new(),
            block_tracker,
            forward_queue: Arc::new(ForwardQueue::new()),
            vm,
            transport,
            last_committed: RwLock::new(LastCommitted { height: BlockHeight::NONE, timestamp: 0 }),
            results_handler: RwLock::new(None),
        });

        let removal_pool = pool.clone();
        pool.pending.set_removal_handler(Arc::new(move |hash, reason| {
            removal_pool.notify_rejected(hash, reason);
        }));

        pool
    }

    /// Registers the handler notified of every rejected or removed transaction.
    pub fn register_results_handler(&self, handler: Arc<dyn Fn(Hash, RejectionReason) + Send + Sync>) {
        *self.results_handler.write() = Some(handler);
    }

    fn notify_rejected(&self, hash: Hash, reason: RejectionReason) {
        if let Some(handler) = self.results_handler.read().as_ref() {
            handler(hash, reason);
        }
    }

    fn validation_context(&self) -> ValidationContext {
        let timeouts = self.config.timeouts();
        let last = self.last_committed.read();
        ValidationContext {
            expiry_window: timeouts.transaction_pool_transaction_expiration_window.as_nanos() as i64,
            last_committed_block_timestamp: last.timestamp,
            future_timestamp_grace: timeouts
                .transaction_pool_future_timestamp_grace_timeout
                .as_nanos() as i64,
            virtual_chain_id: self.config.virtual_chain_id(),
        }
    }

    /// Runs the full admission pipeline against a locally submitted transaction, queueing it
    /// for propagation on success.
    pub fn submit_transaction(&self, signed_tx: SignedTransaction) -> Result<(), RejectionReason> {
        self.admit(signed_tx, true)
    }

    /// Runs the same admission pipeline against a transaction relayed by a peer. A rejection
    /// is not re-broadcast; it simply fails to enter the pending pool.
    pub fn handle_forwarded_transactions(&self, forwarded: ForwardedTransactions) {
        for signed_tx in forwarded.signed_transactions {
            let hash = signed_tx.tx_hash();
            if let Err(reason) = self.admit(signed_tx, false) {
                warn!(%hash, ?reason, "rejected relayed transaction");
            }
        }
    }

    fn admit(&self, signed_tx: SignedTransaction, enqueue_for_forward: bool) -> Result<(), RejectionReason> {
        let hash = signed_tx.tx_hash();

        if !signed_tx.has_valid_signature() {
            self.notify_rejected(hash, RejectionReason::InvalidSignature);
            return Err(RejectionReason::InvalidSignature);
        }

        let already_pending = self.pending.contains(&hash);
        let already_committed = self.committed.contains(&hash);
        if let Err(reason) =
            self.validation_context().validate(&signed_tx.transaction, already_pending, already_committed)
        {
            self.notify_rejected(hash, reason);
            return Err(reason);
        }

        self.pending.insert(hash, signed_tx.clone()).map_err(|reason| {
            self.notify_rejected(hash, reason);
            reason
        })?;

        if enqueue_for_forward {
            self.forward_queue.push(signed_tx);
        }
        Ok(())
    }

    /// Looks up the delivery status of a transaction, as the submitter would observe it.
    pub fn get_committed_transaction_receipt(
        &self,
        tx_hash: Hash,
        transaction_timestamp: TimestampNano,
    ) -> TransactionStatus {
        let timeouts = self.config.timeouts();
        let last = self.last_committed.read();
        let grace = timeouts.transaction_pool_future_timestamp_grace_timeout.as_nanos() as i64;
        if transaction_timestamp > last.timestamp + grace {
            return TransactionStatus::Rejected(RejectionReason::TimestampAheadOfNode);
        }
        drop(last);

        if self.pending.contains(&tx_hash) {
            return TransactionStatus::Pending;
        }
        if let Some(receipt) = self.committed.get(&tx_hash) {
            return TransactionStatus::Committed(receipt);
        }
        TransactionStatus::NoRecordFound
    }

    /// Waits for `block_height` to be reached, then asserts every transaction is admissible:
    /// not already committed, passes the validation context, and the virtual machine's
    /// pre-order check accepts the whole set.
    pub async fn validate_transactions_for_ordering(
        &self,
        block_height: BlockHeight,
        signed_transactions: &[SignedTransaction],
    ) -> Result<(), PoolError> {
        self.block_tracker.wait_for_block(block_height).await?;

        let ctx = self.validation_context();
        for signed_tx in signed_transactions {
            let hash = signed_tx.tx_hash();
            ctx.validate(&signed_tx.transaction, false, self.committed.contains(&hash))?;
        }

        let statuses = self.vm.transaction_set_pre_order(block_height, signed_transactions).await;
        if statuses.iter().any(|s| *s != PreOrderStatus::PreOrderValid) {
            return Err(PoolError::TransactionRejected(RejectionReason::PreOrderFailed));
        }
        Ok(())
    }

    /// Informs the pool that `height` has committed: advances the block tracker, moves each
    /// transaction's receipt into the committed pool, and removes the matching pending
    /// entries without triggering the removal callback.
    pub fn notify_committed_block(
        &self,
        height: BlockHeight,
        timestamp: TimestampNano,
        signed_transactions: &[SignedTransaction],
        receipts: &[TransactionReceipt],
    ) {
        {
            let mut last = self.last_committed.write();
            if height > last.height {
                last.height = height;
                last.timestamp = timestamp;
            }
        }
        self.block_tracker.advance(height);

        for (signed_tx, receipt) in signed_transactions.iter().zip(receipts.iter()) {
            let hash = signed_tx.tx_hash();
            self.committed.insert(hash, receipt.clone(), timestamp);
            self.pending.remove_committed(&hash);
        }
        info!(%height, committed = signed_transactions.len(), "transaction pool observed committed block");
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn committed_len(&self) -> usize {
        self.committed.len()
    }
}

/// Inbound conduit capacity for relayed transactions, sized the same as block-sync's own
/// conduit (§5's "bounded channel, drop on full or not-ready" delivery contract).
const RELAY_CONDUIT_CAPACITY: usize = 64;

/// Spawns the pool's background tasks: the pending/committed pool cleaners, the
/// propagation batcher, and the inbound relay consumer. Registers the pool as the gossip
/// transport's `ForwardedTransactions` handler so a peer's relayed transactions actually
/// reach `handle_forwarded_transactions`.
pub fn spawn_transaction_pool_tasks(
    pool: Arc<TransactionPool>,
    cancel: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let timeouts = pool.config.timeouts().clone();
    let mut handles = Vec::new();

    handles.push(tokio::spawn(run_forwarding_batcher(
        pool.forward_queue.clone(),
        pool.transport.clone(),
        timeouts.transaction_pool_propagation_batch_size,
        timeouts.transaction_pool_propagation_batching_timeout,
        cancel.clone(),
    )));

    {
        let (relay_tx, mut relay_rx) = tokio::sync::mpsc::channel(RELAY_CONDUIT_CAPACITY);
        pool.transport.register_transaction_handler(relay_tx);
        let pool = pool.clone();
        let mut cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.changed() => {
                        if *cancel.borrow() {
                            return;
                        }
                    }
                    message = relay_rx.recv() => {
                        match message {
                            Some(GossipMessage::ForwardedTransactions(forwarded)) => {
                                pool.handle_forwarded_transactions(forwarded);
                            }
                            Some(_) => { /* not an input this consumer listens for */ }
                            None => return,
                        }
                    }
                }
            }
        }));
    }

    {
        let pool = pool.clone();
        let expiry_window = timeouts.transaction_pool_transaction_expiration_window;
        let interval = timeouts.transaction_pool_pending_pool_clear_expired_interval;
        let mut cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.changed() => {
                        if *cancel.borrow() {
                            return;
                        }
                    }
                    _ = ticker.tick() => {
                        let cutoff = pool.last_committed.read().timestamp
                            - expiry_window.as_nanos() as i64;
                        pool.pending.clear_expired_before(cutoff);
                    }
                }
            }
        }));
    }

    {
        let pool = pool.clone();
        let expiry_window = timeouts.transaction_pool_transaction_expiration_window;
        let interval = timeouts.transaction_pool_committed_pool_clear_expired_interval;
        let mut cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.changed() => {
                        if *cancel.borrow() {
                            return;
                        }
                    }
                    _ = ticker.tick() => {
                        let cutoff = pool.last_committed.read().timestamp
                            - expiry_window.as_nanos() as i64;
                        pool.committed.clear_transactions_older_than(cutoff);
                    }
                }
            }
        }));
    }

    handles
}
