//! Transactions and their receipts.

use serde::{Deserialize, Serialize};

use crate::{
    hash::{hash_bytes, Hash},
    keys::{verify_signature, PublicKey, Signature},
};

/// Nanoseconds since the Unix epoch.
pub type TimestampNano = i64;

/// A 32-bit discriminator partitioning independent chains sharing a node process.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct VirtualChainId(pub u32);

impl Default for VirtualChainId {
    fn default() -> Self {
        VirtualChainId(1)
    }
}

/// The body of a transaction, before it is signed.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub virtual_chain_id: VirtualChainId,
    pub timestamp: TimestampNano,
    pub signer_public_key: PublicKey,
    pub contract_name: String,
    pub method_name: String,
    pub input_arguments: Vec<u8>,
}

impl Transaction {
    /// Bytes hashed to produce the transaction's identity. Every field that distinguishes
    /// one transaction from another participates; nothing about the signature does.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64 + self.contract_name.len() + self.method_name.len());
        buf.extend_from_slice(&self.virtual_chain_id.0.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&self.signer_public_key.0);
        buf.extend_from_slice(self.contract_name.as_bytes());
        buf.extend_from_slice(self.method_name.as_bytes());
        buf.extend_from_slice(&self.input_arguments);
        buf
    }

    pub fn hash(&self) -> Hash {
        hash_bytes(&self.canonical_bytes())
    }
}

/// A transaction alongside the signer's signature over its hash.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: Signature,
}

impl SignedTransaction {
    pub fn tx_hash(&self) -> Hash {
        self.transaction.hash()
    }

    /// Verifies the signature against the signer's public key. Does not by itself imply
    /// admissibility; see the pending pool's validation context for that.
    pub fn has_valid_signature(&self) -> bool {
        verify_signature(
            &self.transaction.signer_public_key,
            self.transaction.hash().as_bytes(),
            &self.signature,
        )
    }
}

/// The result of executing a single transaction, produced by the (out of scope) virtual
/// machine and stored alongside the committed transaction.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_hash: Hash,
    pub success: bool,
    pub result_data: Vec<u8>,
}

/// Outcome of submitting a transaction set to the virtual machine's pre-order check.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PreOrderStatus {
    PreOrderValid,
    PreOrderInvalid,
}

/// Why a transaction was rejected or removed from the pending pool.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum RejectionReason {
    DuplicateTransaction,
    TimestampExpired,
    TimestampAheadOfNode,
    VirtualChainMismatch,
    PoolFullAfterEviction,
    PreOrderFailed,
    InvalidSignature,
}

/// The status returned for a transaction-receipt lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Committed(TransactionReceipt),
    NoRecordFound,
    Rejected(RejectionReason),
}
