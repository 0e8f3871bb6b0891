//! Session-key issuance, caching, validation, and expiry.
//!
//! One live session key per (address, scope package) pair. Records persist
//! as JSON in an injected [`KeyValueCache`]; stale or unreadable records are
//! evicted on sight and recovered by re-issuing, never surfaced to callers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use sealink_cache::KeyValueCache;
use sealink_core::Address;

use crate::clock::Clock;
use crate::error::Result;
use crate::key::{CachedCredentialRecord, SessionKey};
use crate::signer::ChallengeSigner;

/// Cache key namespace for credential records.
const SESSION_KEY_PREFIX: &str = "sessionKey";

fn cache_key(owner: &Address, scope_package: &Address) -> String {
    format!(
        "{SESSION_KEY_PREFIX}_{}_{}",
        owner.to_hex(),
        scope_package.to_hex()
    )
}

/// Manager for the session-key lifecycle.
///
/// Generic over the cache backend; the signer and clock are injected so
/// wallets and time stay external concerns. The credential cache is the
/// only shared mutable resource in the core and every mutation goes
/// through these four operations.
pub struct SessionKeys<C: KeyValueCache> {
    cache: Arc<C>,
    signer: Arc<dyn ChallengeSigner>,
    clock: Arc<dyn Clock>,
    /// Per-key issuance locks, so concurrent `issue` calls for the same
    /// (address, scope) collapse into one signing round-trip.
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<C: KeyValueCache> SessionKeys<C> {
    /// Create a new lifecycle manager.
    pub fn new(cache: Arc<C>, signer: Arc<dyn ChallengeSigner>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            signer,
            clock,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Issue (or return the cached) session key for `(owner, scope)`.
    ///
    /// Single-flight: concurrent calls for the same pair share one signing
    /// prompt. A rejected signature surfaces
    /// [`SignatureDenied`](crate::SessionError::SignatureDenied) and leaves
    /// no cache entry.
    pub async fn issue(
        &self,
        owner: Address,
        scope_package: Address,
        ttl_minutes: u32,
    ) -> Result<SessionKey> {
        // Fast path: a valid cached key needs no signing prompt.
        if let Some(key) = self.load(owner, scope_package).await? {
            return Ok(key);
        }

        let key = cache_key(&owner, &scope_package);
        let gate = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(inflight.entry(key.clone()).or_default())
        };
        let _issuing = gate.lock().await;

        // Re-check under the gate: a concurrent caller may have finished
        // the signing round-trip while we waited.
        if let Some(cached) = self.load(owner, scope_package).await? {
            return Ok(cached);
        }

        let result = self
            .issue_uncached(owner, scope_package, ttl_minutes, &key)
            .await;

        let mut inflight = self.inflight.lock().await;
        inflight.remove(&key);

        result
    }

    async fn issue_uncached(
        &self,
        owner: Address,
        scope_package: Address,
        ttl_minutes: u32,
        key: &str,
    ) -> Result<SessionKey> {
        let now = self.clock.now_ms();
        let mut session = SessionKey::new(owner, scope_package, ttl_minutes, now);

        // Pending: the challenge is out with the external signer. A
        // rejection returns the pair to Unissued without caching.
        let signature = self.signer.sign(&session.challenge()).await?;
        session.attach_signature(signature);

        let record = CachedCredentialRecord::new(session.export(), now);
        let json = serde_json::to_vec(&record)
            .map_err(|e| crate::error::SessionError::Serialization(e.to_string()))?;
        self.cache.put(key, &json).await?;

        tracing::debug!(%owner, scope = %scope_package, ttl_minutes, "issued session key");
        Ok(session)
    }

    /// Load the cached session key for `(owner, scope)`, if still usable.
    ///
    /// Returns `None` when the record is absent, written under another
    /// format version, or past its TTL, evicting the stale record as a
    /// side effect in the latter two cases.
    pub async fn load(&self, owner: Address, scope_package: Address) -> Result<Option<SessionKey>> {
        let key = cache_key(&owner, &scope_package);
        let Some(bytes) = self.cache.get(&key).await? else {
            return Ok(None);
        };

        let record: CachedCredentialRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(%owner, error = %e, "unreadable credential record, evicting");
                self.cache.delete(&key).await?;
                return Ok(None);
            }
        };

        if !record.format_matches() {
            tracing::warn!(
                %owner,
                found = %record.format_version,
                "credential format version mismatch, evicting"
            );
            self.cache.delete(&key).await?;
            return Ok(None);
        }

        if record.is_expired(self.clock.now_ms()) {
            tracing::debug!(%owner, "session key expired, evicting");
            self.cache.delete(&key).await?;
            return Ok(None);
        }

        Ok(Some(SessionKey::from_exported(record.payload)))
    }

    /// Whether a usable cached session exists for `(owner, scope)`.
    pub async fn has_valid_cached_session(
        &self,
        owner: Address,
        scope_package: Address,
    ) -> Result<bool> {
        Ok(self.load(owner, scope_package).await?.is_some())
    }

    /// Scan the whole namespace and evict every expired or unreadable
    /// record. Returns how many were evicted.
    ///
    /// Periodic hygiene, independent of any single lookup.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let now = self.clock.now_ms();
        let entries = self.cache.scan(&format!("{SESSION_KEY_PREFIX}_")).await?;

        let mut evicted = 0;
        for (key, bytes) in entries {
            let stale = match serde_json::from_slice::<CachedCredentialRecord>(&bytes) {
                Ok(record) => record.is_expired(now),
                // Unreadable records are stale by definition.
                Err(_) => true,
            };
            if stale {
                self.cache.delete(&key).await?;
                evicted += 1;
            }
        }

        if evicted > 0 {
            tracing::debug!(evicted, "swept expired session keys");
        }
        Ok(evicted)
    }

    /// Explicitly revoke the cached key for `(owner, scope)`, e.g. on
    /// account switch or sign-out.
    pub async fn clear(&self, owner: Address, scope_package: Address) -> Result<()> {
        self.cache.delete(&cache_key(&owner, &scope_package)).await?;
        Ok(())
    }

    /// The injected clock (shared with callers that need consistent time).
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::SessionError;
    use crate::key::CREDENTIAL_FORMAT_VERSION;
    use crate::signer::{ChallengeSigner, DenyingSigner, KeypairSigner};
    use async_trait::async_trait;
    use sealink_cache::MemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Signer that counts signing round-trips.
    struct CountingSigner {
        inner: KeypairSigner,
        calls: AtomicUsize,
    }

    impl CountingSigner {
        fn new() -> Self {
            Self {
                inner: KeypairSigner::from_seed(&[9; 32]),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChallengeSigner for CountingSigner {
        fn address(&self) -> Address {
            self.inner.address()
        }

        async fn sign(&self, challenge: &[u8]) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent issue() callers pile up on the gate.
            tokio::task::yield_now().await;
            self.inner.sign(challenge).await
        }
    }

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn manager_with(
        signer: Arc<dyn ChallengeSigner>,
        clock: Arc<ManualClock>,
    ) -> SessionKeys<MemoryCache> {
        SessionKeys::new(Arc::new(MemoryCache::new()), signer, clock)
    }

    #[tokio::test]
    async fn test_issue_then_load_hits_cache() {
        let clock = Arc::new(ManualClock::at(0));
        let manager = manager_with(Arc::new(KeypairSigner::generate()), clock);

        let issued = manager.issue(addr(0xaa), addr(1), 30).await.unwrap();
        let loaded = manager.load(addr(0xaa), addr(1)).await.unwrap().unwrap();
        assert_eq!(issued, loaded);
        assert!(loaded.is_active(0));
    }

    #[tokio::test]
    async fn test_load_after_ttl_returns_none() {
        // Issue for 0xAA with ttl 30 minutes; advance 31; load is None.
        let clock = Arc::new(ManualClock::at(0));
        let manager = manager_with(Arc::new(KeypairSigner::generate()), Arc::clone(&clock));

        manager.issue(addr(0xaa), addr(1), 30).await.unwrap();
        clock.advance_minutes(31);

        assert!(manager.load(addr(0xaa), addr(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_expiry_boundary_is_inclusive() {
        let clock = Arc::new(ManualClock::at(0));
        let manager = manager_with(Arc::new(KeypairSigner::generate()), Arc::clone(&clock));

        manager.issue(addr(0xaa), addr(1), 30).await.unwrap();

        clock.advance_ms(30 * 60_000 - 1);
        assert!(manager.load(addr(0xaa), addr(1)).await.unwrap().is_some());

        clock.advance_ms(1);
        assert!(manager.load(addr(0xaa), addr(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_denied_signature_leaves_no_cache_entry() {
        let clock = Arc::new(ManualClock::at(0));
        let manager = manager_with(Arc::new(DenyingSigner::new(addr(0xaa))), clock);

        let err = manager.issue(addr(0xaa), addr(1), 30).await.unwrap_err();
        assert!(matches!(err, SessionError::SignatureDenied));
        assert!(manager.load(addr(0xaa), addr(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_issue_after_denial_retries_signing() {
        let clock = Arc::new(ManualClock::at(0));
        let cache = Arc::new(MemoryCache::new());
        let denying = SessionKeys::new(
            Arc::clone(&cache),
            Arc::new(DenyingSigner::new(addr(0xaa))),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        assert!(denying.issue(addr(0xaa), addr(1), 30).await.is_err());

        // Same cache, approving signer: issuance proceeds from Unissued.
        let approving = SessionKeys::new(
            cache,
            Arc::new(KeypairSigner::generate()),
            clock as Arc<dyn Clock>,
        );
        assert!(approving.issue(addr(0xaa), addr(1), 30).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_issue_single_flight() {
        let clock = Arc::new(ManualClock::at(0));
        let signer = Arc::new(CountingSigner::new());
        let manager = Arc::new(SessionKeys::new(
            Arc::new(MemoryCache::new()),
            Arc::clone(&signer) as Arc<dyn ChallengeSigner>,
            clock as Arc<dyn Clock>,
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.issue(addr(0xaa), addr(1), 30).await.unwrap()
            }));
        }

        let mut keys = Vec::new();
        for handle in handles {
            keys.push(handle.await.unwrap());
        }

        // One signing round-trip, every caller got the same key.
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
        assert!(keys.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_sweep_evicts_exactly_the_expired_set() {
        let clock = Arc::new(ManualClock::at(0));
        let manager = manager_with(Arc::new(KeypairSigner::generate()), Arc::clone(&clock));

        manager.issue(addr(0x01), addr(1), 10).await.unwrap();
        manager.issue(addr(0x02), addr(1), 60).await.unwrap();
        manager.issue(addr(0x03), addr(1), 5).await.unwrap();

        clock.advance_minutes(15);
        let evicted = manager.sweep_expired().await.unwrap();

        assert_eq!(evicted, 2);
        assert!(manager.load(addr(0x01), addr(1)).await.unwrap().is_none());
        assert!(manager.load(addr(0x02), addr(1)).await.unwrap().is_some());
        assert!(manager.load(addr(0x03), addr(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_format_mismatch_discarded_unread() {
        let clock = Arc::new(ManualClock::at(0));
        let cache = Arc::new(MemoryCache::new());
        let manager = SessionKeys::new(
            Arc::clone(&cache),
            Arc::new(KeypairSigner::generate()),
            clock as Arc<dyn Clock>,
        );

        manager.issue(addr(0xaa), addr(1), 30).await.unwrap();

        // Rewrite the record under a foreign format version.
        let key = cache_key(&addr(0xaa), &addr(1));
        let bytes = cache.get(&key).await.unwrap().unwrap();
        let mut record: CachedCredentialRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record.format_version, CREDENTIAL_FORMAT_VERSION);
        record.format_version = "0.9".to_string();
        cache
            .put(&key, &serde_json::to_vec(&record).unwrap())
            .await
            .unwrap();

        assert!(manager.load(addr(0xaa), addr(1)).await.unwrap().is_none());
        // Evicted as a side effect.
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_revokes() {
        let clock = Arc::new(ManualClock::at(0));
        let manager = manager_with(Arc::new(KeypairSigner::generate()), clock);

        manager.issue(addr(0xaa), addr(1), 30).await.unwrap();
        manager.clear(addr(0xaa), addr(1)).await.unwrap();
        assert!(manager.load(addr(0xaa), addr(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sessions_scoped_per_package() {
        let clock = Arc::new(ManualClock::at(0));
        let manager = manager_with(Arc::new(KeypairSigner::generate()), clock);

        manager.issue(addr(0xaa), addr(1), 30).await.unwrap();
        assert!(manager.load(addr(0xaa), addr(2)).await.unwrap().is_none());
    }
}
