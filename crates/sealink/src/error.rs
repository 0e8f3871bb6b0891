//! Error types for the messaging client.

use sealink_core::CoreError;
use sealink_envelope::EnvelopeError;
use sealink_ledger::ChainError;
use sealink_session::SessionError;
use sealink_storage::StorageError;
use thiserror::Error;

/// Errors that can occur during messaging client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A member address failed textual validation.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Channel creation was attempted with no members.
    #[error("a channel needs at least one member besides its creator")]
    EmptyMembership,

    /// The caller's capability is unknown, revoked, or for another channel.
    #[error("not a member of this channel")]
    NotAMember,

    /// The decrypt policy denied access. Surfaced verbatim, never retried.
    #[error("decrypt policy denied access: {0}")]
    PolicyDenied(String),

    /// The chain rejected the transaction.
    #[error("chain rejected transaction: {0}")]
    ChainRejected(String),

    /// A chain object read found nothing.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// Record codec failure.
    #[error("codec error: {0}")]
    Codec(String),

    /// Session-key lifecycle error (signature denial, cache failure).
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Envelope encryption or decryption error.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Payload storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ChainError> for ClientError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::CapRevoked => ClientError::NotAMember,
            ChainError::Rejected(reason) => ClientError::ChainRejected(reason),
            ChainError::ObjectNotFound(id) => ClientError::ObjectNotFound(id),
        }
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidAddress(s) => ClientError::InvalidAddress(s),
            CoreError::Encoding(s) | CoreError::Decoding(s) => ClientError::Codec(s),
        }
    }
}

/// Result type for messaging client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
