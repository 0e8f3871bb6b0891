//! Error types for sealink core.

use thiserror::Error;

/// Errors from core identifier and record handling.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed account address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Record encoding error.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Record decoding error.
    #[error("decoding error: {0}")]
    Decoding(String),
}
