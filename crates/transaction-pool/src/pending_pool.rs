use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tn_types::{Hash, RejectionReason, SignedTransaction};
use tracing::debug;

/// Rough wire size of a transaction, used purely to bound the pending pool's footprint; it
/// does not need to match the bytes actually sent over the gossip transport.
fn estimated_size_bytes(signed_tx: &SignedTransaction) -> usize {
    let tx = &signed_tx.transaction;
    32 // signer public key
        + 8 // timestamp
        + 4 // virtual chain id
        + 64 // signature
        + tx.contract_name.len()
        + tx.method_name.len()
        + tx.input_arguments.len()
}

struct Entry {
    signed_tx: SignedTransaction,
    size_bytes: usize,
}

struct Inner {
    entries: IndexMap<Hash, Entry>,
    total_bytes: usize,
}

/// The ordered, size-bounded pool of transactions awaiting inclusion in a block.
///
/// Entries are kept in insertion order so that eviction under the size cap always drops the
/// oldest admitted transaction first.
pub struct PendingPool {
    capacity_bytes: usize,
    inner: Mutex<Inner>,
    on_removed: RwLock<Option<Arc<dyn Fn(Hash, RejectionReason) + Send + Sync>>>,
}

impl PendingPool {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            inner: Mutex::new(Inner { entries: IndexMap::new(), total_bytes: 0 }),
            on_removed: RwLock::new(None),
        }
    }

    /// Registers the callback invoked for every removal that is not a commit.
    pub fn set_removal_handler(&self, handler: Arc<dyn Fn(Hash, RejectionReason) + Send + Sync>) {
        *self.on_removed.write() = Some(handler);
    }

    fn notify_removed(&self, hash: Hash, reason: RejectionReason) {
        if let Some(handler) = self.on_removed.read().as_ref() {
            handler(hash, reason);
        }
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.inner.lock().entries.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash) -> Option<SignedTransaction> {
        self.inner.lock().entries.get(hash).map(|e| e.signed_tx.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.inner.lock().total_bytes
    }

    /// Admits `signed_tx`, evicting the oldest entries first if needed to make room. Returns
    /// `Err(PoolFullAfterEviction)` without inserting if the transaction alone cannot fit even
    /// once the pool has been fully drained.
    pub fn insert(&self, hash: Hash, signed_tx: SignedTransaction) -> Result<(), RejectionReason> {
        let size_bytes = estimated_size_bytes(&signed_tx);
        if size_bytes > self.capacity_bytes {
            return Err(RejectionReason::PoolFullAfterEviction);
        }

        let mut evicted = Vec::new();
        {
            let mut inner = self.inner.lock();
            while inner.total_bytes + size_bytes > self.capacity_bytes {
                match inner.entries.shift_remove_index(0) {
                    Some((evicted_hash, entry)) => {
                        inner.total_bytes -= entry.size_bytes;
                        evicted.push(evicted_hash);
                    }
                    None => break,
                }
            }
            if inner.total_bytes + size_bytes > self.capacity_bytes {
                for evicted_hash in evicted {
                    self.notify_removed(evicted_hash, RejectionReason::PoolFullAfterEviction);
                }
                return Err(RejectionReason::PoolFullAfterEviction);
            }
            inner.entries.insert(hash, Entry { signed_tx, size_bytes });
            inner.total_bytes += size_bytes;
        }
        for evicted_hash in evicted {
            self.notify_removed(evicted_hash, RejectionReason::PoolFullAfterEviction);
        }
        debug!(%hash, size_bytes, "admitted transaction to pending pool");
        Ok(())
    }

    /// Removes `hash` without invoking the removal callback, because the transaction was
    /// committed rather than rejected.
    pub fn remove_committed(&self, hash: &Hash) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.shift_remove(hash) {
            inner.total_bytes -= entry.size_bytes;
        }
    }

    /// Evicts every entry admitted before `cutoff`, invoking the removal callback with
    /// `TimestampExpired` for each.
    pub fn clear_expired_before(&self, cutoff: tn_types::TimestampNano) {
        let expired: Vec<Hash> = {
            let inner = self.inner.lock();
            inner
                .entries
                .iter()
                .filter(|(_, e)| e.signed_tx.transaction.timestamp < cutoff)
                .map(|(hash, _)| *hash)
                .collect()
        };
        if expired.is_empty() {
            return;
        }
        {
            let mut inner = self.inner.lock();
            for hash in &expired {
                if let Some(entry) = inner.entries.shift_remove(hash) {
                    inner.total_bytes -= entry.size_bytes;
                }
            }
        }
        for hash in expired {
            self.notify_removed(hash, RejectionReason::TimestampExpired);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use rand::{rngs::StdRng, SeedableRng};
    use tn_types::{KeyPair, Transaction, VirtualChainId};

    use super::*;

    fn signed_tx(key: &KeyPair, timestamp: i64, payload_len: usize) -> SignedTransaction {
        let tx = Transaction {
            virtual_chain_id: VirtualChainId(1),
            timestamp,
            signer_public_key: key.public_key(),
            contract_name: "BenchmarkToken".to_string(),
            method_name: "transfer".to_string(),
            input_arguments: vec![0u8; payload_len],
        };
        let signature = key.sign(tx.hash().as_bytes());
        SignedTransaction { transaction: tx, signature }
    }

    #[test]
    fn rejects_oversized_single_transaction() {
        let pool = PendingPool::new(64);
        let key = KeyPair::generate(&mut StdRng::seed_from_u64(1));
        let tx = signed_tx(&key, 0, 1024);
        let hash = tx.tx_hash();
        assert_eq!(pool.insert(hash, tx).unwrap_err(), RejectionReason::PoolFullAfterEviction);
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn evicts_oldest_entry_first_to_make_room() {
        let pool = PendingPool::new(220);
        let removed = Arc::new(StdMutex::new(Vec::new()));
        let removed_clone = removed.clone();
        pool.set_removal_handler(Arc::new(move |hash, reason| {
            removed_clone.lock().unwrap().push((hash, reason));
        }));

        let key = KeyPair::generate(&mut StdRng::seed_from_u64(2));
        let first = signed_tx(&key, 0, 10);
        let first_hash = first.tx_hash();
        pool.insert(first_hash, first).expect("first admitted");

        let second = signed_tx(&key, 1, 10);
        let second_hash = second.tx_hash();
        pool.insert(second_hash, second).expect("second admitted");

        let third = signed_tx(&key, 2, 100);
        let third_hash = third.tx_hash();
        pool.insert(third_hash, third).expect("third admitted after eviction");

        assert!(!pool.contains(&first_hash));
        assert!(pool.contains(&second_hash) || pool.contains(&third_hash));
        assert_eq!(removed.lock().unwrap()[0].0, first_hash);
        assert_eq!(removed.lock().unwrap()[0].1, RejectionReason::PoolFullAfterEviction);
    }

    #[test]
    fn remove_committed_does_not_invoke_removal_handler() {
        let pool = PendingPool::new(1024);
        let called = Arc::new(StdMutex::new(false));
        let called_clone = called.clone();
        pool.set_removal_handler(Arc::new(move |_, _| {
            *called_clone.lock().unwrap() = true;
        }));

        let key = KeyPair::generate(&mut StdRng::seed_from_u64(3));
        let tx = signed_tx(&key, 0, 10);
        let hash = tx.tx_hash();
        pool.insert(hash, tx).expect("admitted");
        pool.remove_committed(&hash);

        assert!(!pool.contains(&hash));
        assert!(!*called.lock().unwrap());
    }

    #[test]
    fn clear_expired_before_evicts_and_notifies() {
        let pool = PendingPool::new(1024);
        let removed = Arc::new(StdMutex::new(Vec::new()));
        let removed_clone = removed.clone();
        pool.set_removal_handler(Arc::new(move |hash, reason| {
            removed_clone.lock().unwrap().push((hash, reason));
        }));

        let key = KeyPair::generate(&mut StdRng::seed_from_u64(4));
        let stale = signed_tx(&key, 100, 10);
        let stale_hash = stale.tx_hash();
        pool.insert(stale_hash, stale).expect("admitted");

        let fresh = signed_tx(&key, 10_000, 10);
        let fresh_hash = fresh.tx_hash();
        pool.insert(fresh_hash, fresh).expect("admitted");

        pool.clear_expired_before(5_000);

        assert!(!pool.contains(&stale_hash));
        assert!(pool.contains(&fresh_hash));
        assert_eq!(removed.lock().unwrap(), vec![(stale_hash, RejectionReason::TimestampExpired)]);
    }
}
