//! Error types for envelope encryption.

use sealink_core::KeyVersion;
use thiserror::Error;

/// Errors that can occur while sealing or opening envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// A message references a key version absent from both `latest` and
    /// `history`. Under the retention invariant this must never happen;
    /// it indicates data corruption or a pruning bug, not a caller mistake.
    #[error("key version {0} not found in channel key history")]
    KeyVersionNotFound(KeyVersion),

    /// Encryption error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decryption error.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Unsealed content key has the wrong length.
    #[error("invalid content key length: expected 32, got {0}")]
    InvalidKeyLength(usize),

    /// Envelope wire-format error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
