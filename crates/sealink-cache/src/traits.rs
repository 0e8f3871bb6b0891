//! KeyValueCache trait: the abstract interface for local record persistence.
//!
//! This trait lets the session-key lifecycle be storage-agnostic: the
//! original deployment medium was browser local storage, here the primary
//! implementation is SQLite with in-memory for tests.

use async_trait::async_trait;

use crate::error::Result;

/// The KeyValueCache trait: async interface for a persisted key→record store.
///
/// Entries are plain data, never code. Keys are UTF-8 strings under a
/// caller-chosen namespace prefix; values are opaque byte records whose
/// format (and format versioning) the caller owns.
///
/// # Design Notes
///
/// - **No TTL here**: expiry is a property of the stored record, enforced by
///   the layer above. The cache only stores, retrieves, and scans.
/// - **Safe under concurrent read/evict**: implementations must tolerate a
///   `delete` racing a `get` for the same key.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Get the record stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any existing record.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove the record under `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List every `(key, value)` pair whose key starts with `prefix`,
    /// ordered by key.
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;
}
