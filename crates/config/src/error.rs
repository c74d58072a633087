use thiserror::Error;

/// Fatal, construction-time configuration errors. Per the error-handling design, anything
/// that gets this far at startup should abort the process rather than be retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("quorum percentage must be in 0..=100, got {0}")]
    QuorumPercentageOutOfRange(u32),

    #[error("federation must contain at least one node")]
    EmptyFederation,

    #[error("node key pair is required")]
    MissingNodeKeyPair,
}
