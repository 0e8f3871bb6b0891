//! Error types for ledger operations.

use thiserror::Error;

/// Errors reported by a ledger backend.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The transaction failed on-chain validation. Non-idempotent writes
    /// must not be blindly retried without re-reading chain state first.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// No object exists for the given id.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// The presented capability was never issued, belongs to another
    /// channel, or has been invalidated by a revoke.
    #[error("member capability not recognized or revoked")]
    CapRevoked,
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, ChainError>;
