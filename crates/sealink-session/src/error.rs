//! Error types for the session-key lifecycle.

use thiserror::Error;

/// Errors that can occur during session-key operations.
///
/// Expired and format-mismatched cache entries are recovered internally
/// (discard and re-issue) and never surface through this type.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The external signer rejected the challenge. No cache entry is
    /// written; the key returns to the unissued state.
    #[error("signature denied by signer")]
    SignatureDenied,

    /// Credential cache error.
    #[error("credential cache error: {0}")]
    Cache(#[from] sealink_cache::CacheError),

    /// Credential record serialization error.
    #[error("credential serialization error: {0}")]
    Serialization(String),
}

/// Result type for session-key operations.
pub type Result<T> = std::result::Result<T, SessionError>;
