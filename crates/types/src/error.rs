use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("public key bytes do not decode to a valid Ed25519 point")]
    InvalidPublicKey,
}
