//! In-memory, content-addressed implementation of the StorageAdapter trait.
//!
//! Blob references are blake3 hashes of the payload, so identical payloads
//! deduplicate. Primarily for tests and offline development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use sealink_core::BlobRef;

use crate::error::{Result, StorageError};
use crate::traits::StorageAdapter;

/// In-memory content-addressed storage.
///
/// All data is lost when the adapter is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    /// Create a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the storage holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn upload(&self, bytes: Bytes) -> Result<BlobRef> {
        let hash = blake3::hash(&bytes).to_hex().to_string();
        let mut blobs = self.blobs.write().unwrap_or_else(|e| e.into_inner());
        blobs.insert(hash.clone(), bytes);
        Ok(BlobRef::new(hash))
    }

    async fn download(&self, blob_ref: &BlobRef) -> Result<Bytes> {
        let blobs = self.blobs.read().unwrap_or_else(|e| e.into_inner());
        blobs
            .get(blob_ref.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(blob_ref.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_download_roundtrip() {
        let storage = MemoryStorage::new();
        let payload = Bytes::from_static(b"encrypted payload bytes");

        let blob_ref = storage.upload(payload.clone()).await.unwrap();
        let downloaded = storage.download(&blob_ref).await.unwrap();

        assert_eq!(downloaded, payload);
    }

    #[tokio::test]
    async fn test_download_unknown_ref_is_not_found() {
        let storage = MemoryStorage::new();
        let missing = BlobRef::new("deadbeef");

        let err = storage.download(&missing).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_identical_payloads_deduplicate() {
        let storage = MemoryStorage::new();
        let a = storage.upload(Bytes::from_static(b"same")).await.unwrap();
        let b = storage.upload(Bytes::from_static(b"same")).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(storage.len(), 1);
    }
}
