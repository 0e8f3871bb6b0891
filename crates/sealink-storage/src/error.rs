//! Error types for the storage adapter.

use thiserror::Error;

/// Errors reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend rejected or failed the upload. Uploads are never
    /// silently partial: either a blob reference comes back or this does.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// No blob exists for the given reference.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The backend is unreachable or unhealthy.
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
