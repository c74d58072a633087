use indexmap::IndexMap;
use parking_lot::Mutex;
use tn_types::{Hash, TimestampNano, TransactionReceipt};

struct Entry {
    receipt: TransactionReceipt,
    committed_at: TimestampNano,
}

/// The ordered pool of receipts for already-committed transactions, retained only long
/// enough for `GetCommittedTransactionReceipt` to answer a query about them.
pub struct CommittedPool {
    entries: Mutex<IndexMap<Hash, Entry>>,
}

impl CommittedPool {
    pub fn new() -> Self {
        Self { entries: Mutex::new(IndexMap::new()) }
    }

    pub fn insert(&self, hash: Hash, receipt: TransactionReceipt, committed_at: TimestampNano) {
        self.entries.lock().insert(hash, Entry { receipt, committed_at });
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.entries.lock().contains_key(hash)
    }

    pub fn get(&self, hash: &Hash) -> Option<TransactionReceipt> {
        self.entries.lock().get(hash).map(|e| e.receipt.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Removes every entry committed before `cutoff`.
    pub fn clear_transactions_older_than(&self, cutoff: TimestampNano) {
        self.entries.lock().retain(|_, entry| entry.committed_at >= cutoff);
    }
}

impl Default for CommittedPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(hash: Hash) -> TransactionReceipt {
        TransactionReceipt { tx_hash: hash, success: true, result_data: vec![] }
    }

    #[test]
    fn clears_only_entries_older_than_cutoff() {
        let pool = CommittedPool::new();
        let old_hash = Hash([1u8; 32]);
        let new_hash = Hash([2u8; 32]);
        pool.insert(old_hash, receipt(old_hash), 100);
        pool.insert(new_hash, receipt(new_hash), 10_000);

        pool.clear_transactions_older_than(5_000);

        assert!(!pool.contains(&old_hash));
        assert!(pool.contains(&new_hash));
    }

    #[test]
    fn get_returns_stored_receipt() {
        let pool = CommittedPool::new();
        let hash = Hash([3u8; 32]);
        pool.insert(hash, receipt(hash), 0);
        assert_eq!(pool.get(&hash), Some(receipt(hash)));
    }
}
