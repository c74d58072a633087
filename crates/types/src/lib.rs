//! Core data model shared by every crate in this workspace: keys, hashes, block pairs and
//! transactions. Nothing in this crate talks to the network, to storage, or to a clock —
//! it only defines what the other crates pass around.

pub mod block;
pub mod error;
pub mod hash;
pub mod keys;
pub mod transaction;

pub use block::{
    BlockHeader, BlockHeight, BlockPair, BlockProof, BlockProofType, BlockType, ConsensusAlgoType,
    FederationNode, GossipPeer, ResultsBlock, SenderSignature, TransactionsBlock,
};
pub use error::TypesError;
pub use hash::{hash_bytes, xor, Hash};
pub use keys::{verify_signature, KeyPair, PublicKey, Signature};
pub use transaction::{
    PreOrderStatus, RejectionReason, SignedTransaction, TimestampNano, Transaction,
    TransactionReceipt, TransactionStatus, VirtualChainId,
};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_transaction(vcid: u32, signer: PublicKey) -> Transaction {
        Transaction {
            virtual_chain_id: VirtualChainId(vcid),
            timestamp: 1_700_000_000_000_000_000,
            signer_public_key: signer,
            contract_name: "BenchmarkToken".to_string(),
            method_name: "transfer".to_string(),
            input_arguments: vec![1, 2, 3],
        }
    }

    #[test]
    fn tx_hash_is_stable_across_calls_and_clones() {
        let rng_key = KeyPair::generate(&mut StdRng::seed_from_u64(1));
        let tx = sample_transaction(42, rng_key.public_key());
        assert_eq!(tx.hash(), tx.clone().hash());
        assert_eq!(tx.hash(), tx.hash());
    }

    #[test]
    fn tx_hash_differs_on_any_field_change() {
        let rng_key = KeyPair::generate(&mut StdRng::seed_from_u64(2));
        let tx = sample_transaction(42, rng_key.public_key());
        let mut other = tx.clone();
        other.timestamp += 1;
        assert_ne!(tx.hash(), other.hash());
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let key = KeyPair::generate(&mut StdRng::seed_from_u64(3));
        let tx = sample_transaction(7, key.public_key());
        let signature = key.sign(tx.hash().as_bytes());
        let signed = SignedTransaction { transaction: tx, signature };
        assert!(signed.has_valid_signature());
    }

    #[test]
    fn signature_does_not_verify_under_wrong_key() {
        let key = KeyPair::generate(&mut StdRng::seed_from_u64(4));
        let other_key = KeyPair::generate(&mut StdRng::seed_from_u64(5));
        let tx = sample_transaction(7, key.public_key());
        let signature = other_key.sign(tx.hash().as_bytes());
        let signed = SignedTransaction { transaction: tx, signature };
        assert!(!signed.has_valid_signature());
    }

    #[test]
    fn xor_of_hash_with_itself_is_zero() {
        let h = hash_bytes(b"some block bytes");
        assert_eq!(xor(&h, &h), [0u8; 32]);
    }

    #[test]
    fn block_height_arithmetic() {
        assert!(BlockHeight::NONE.is_none());
        assert_eq!(BlockHeight::NONE.next(), BlockHeight(1));
        assert_eq!(BlockHeight(5) - BlockHeight(2), 3);
    }

    #[test]
    fn tx_hash_is_stable_across_a_serialization_round_trip() {
        let key = KeyPair::generate(&mut StdRng::seed_from_u64(6));
        let tx = sample_transaction(1, key.public_key());
        let encoded = bincode::serialize(&tx).expect("serialize");
        let decoded: Transaction = bincode::deserialize(&encoded).expect("deserialize");
        assert_eq!(tx.hash(), decoded.hash());
    }
}
