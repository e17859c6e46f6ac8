//! Error definitions shared by every subsystem.

use thiserror::Error;

/// Errors that can occur while building, signing or dispatching transactions.
#[derive(Debug, Error)]
pub enum PactError {
    /// Missing or unresolvable configuration (network, sender, chain id, keys).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A submission-class operation was given a transaction with empty slots.
    #[error("Transaction is not fully signed; unsigned signer indices: {}", format_indices(.indices))]
    Unsigned { indices: Vec<usize> },

    /// Signature collection finished with slots no authority could fill.
    #[error("Missing signatures for signer indices: {}", format_indices(.indices))]
    MissingSignatures { indices: Vec<usize> },

    /// Merge was attempted across envelopes of different commands.
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// The chain executed the command and reported a failure.
    #[error("Chain {chain_id} reported failure: {error}")]
    ChainFailure {
        chain_id: String,
        request_key: Option<String>,
        error: serde_json::Value,
    },

    /// RPC connection or protocol failure.
    #[error("RPC error: {0}")]
    Transport(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Underlying HTTP client failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Key loading or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// A signature did not verify against its slot's public key.
    #[error("Invalid signature at signer index {index}: {reason}")]
    InvalidSignature { index: usize, reason: String },

    /// Envelope is structurally unusable (unparseable cmd, slot count mismatch).
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// JSON encoding or decoding failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for pact operations.
pub type PactResult<T> = Result<T, PactError>;

fn format_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
