//! StorageAdapter trait: the contract between the messaging client and the
//! off-chain blob network.
//!
//! Two operations only. The client treats the adapter as an injectable
//! dependency; no protocol logic may assume a specific backend.

use async_trait::async_trait;
use bytes::Bytes;

use sealink_core::BlobRef;

use crate::error::Result;

/// Pluggable off-chain payload storage.
///
/// `upload` is not required to be idempotent; `download` must fail with
/// [`NotFound`](crate::StorageError::NotFound) or
/// [`BackendUnavailable`](crate::StorageError::BackendUnavailable) rather
/// than return partial bytes.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Upload a payload and return the backend-issued blob reference.
    async fn upload(&self, bytes: Bytes) -> Result<BlobRef>;

    /// Download the payload for a previously issued blob reference.
    async fn download(&self, blob_ref: &BlobRef) -> Result<Bytes>;
}
