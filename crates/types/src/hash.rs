//! Cryptographic hashing primitives shared by the block and transaction types.

use blake2::{digest::consts::U32, Blake2b, Digest};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// A 32-byte digest produced by [`hash_bytes`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Hashes an arbitrary byte slice with the node's chosen digest function.
///
/// All on-chain digests (transaction hashes, sub-block hashes) go through this single
/// function so that the choice of hash function is made in exactly one place.
pub fn hash_bytes(bytes: &[u8]) -> Hash {
    let mut hasher = Blake2b256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&out);
    Hash(buf)
}

/// XORs two equal-length digests, as required by the benchmark consensus block proof.
pub fn xor(a: &Hash, b: &Hash) -> [u8; 32] {
    let mut out = [0u8; 32];
    for i in 0..32 {
        out[i] = a.0[i] ^ b.0[i];
    }
    out
}
