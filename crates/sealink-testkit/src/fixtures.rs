//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a shared in-memory ledger,
//! storage, and credential cache, plus per-user clients built from
//! deterministic keypairs. Time is a [`ManualClock`] so TTL behavior is
//! exact.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use sealink::{ClientConfig, DecryptPolicy, MembershipPolicy, MessagingClient, PackageConfig};
use sealink_cache::MemoryCache;
use sealink_core::{Address, BlobRef};
use sealink_ledger::MemoryLedger;
use sealink_session::{ChallengeSigner, Clock, KeypairSigner, ManualClock, SessionKeys};
use sealink_storage::{MemoryStorage, StorageAdapter, StorageError};

/// Fixed test epoch: 2023-11-14T22:13:20Z in Unix ms.
pub const TEST_EPOCH_MS: i64 = 1_700_000_000_000;

/// Storage backend with injectable upload failures.
///
/// Wraps [`MemoryStorage`]; flipping [`fail_uploads`](Self::fail_uploads)
/// makes every subsequent upload fail while downloads keep working, which
/// is exactly the fault the send path must not leave partial state behind
/// on.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail_uploads: AtomicBool,
}

impl FlakyStorage {
    /// Create a healthy instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle upload failure injection.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of blobs actually stored.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl StorageAdapter for FlakyStorage {
    async fn upload(&self, bytes: Bytes) -> Result<BlobRef, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("injected upload failure".into()));
        }
        self.inner.upload(bytes).await
    }

    async fn download(&self, blob_ref: &BlobRef) -> Result<Bytes, StorageError> {
        self.inner.download(blob_ref).await
    }
}

/// The concrete client type tests work with.
pub type TestClient = MessagingClient<MemoryLedger, FlakyStorage, MembershipPolicy, MemoryCache>;

/// Shared backends for a multi-user test scenario.
///
/// All clients built from one fixture talk to the same ledger, storage,
/// and credential cache, so cross-user visibility and revocation behave as
/// they would against real shared infrastructure.
pub struct TestFixture {
    pub ledger: Arc<MemoryLedger>,
    pub storage: Arc<FlakyStorage>,
    pub cache: Arc<MemoryCache>,
    pub clock: Arc<ManualClock>,
    pub config: ClientConfig,
}

impl TestFixture {
    /// Create a fixture at [`TEST_EPOCH_MS`] with testnet-shaped config.
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(MemoryLedger::new()),
            storage: Arc::new(FlakyStorage::new()),
            cache: Arc::new(MemoryCache::new()),
            clock: Arc::new(ManualClock::at(TEST_EPOCH_MS)),
            config: ClientConfig::from(&PackageConfig::testnet()),
        }
    }

    /// Same fixture but with a custom fetch page size.
    pub fn with_page_size(page_size: usize) -> Self {
        let mut fixture = Self::new();
        fixture.config = fixture.config.with_page_size(page_size);
        fixture
    }

    /// A deterministic user address derived from `seed`.
    pub fn address(seed: u8) -> Address {
        KeypairSigner::from_seed(&[seed; 32]).address()
    }

    /// Build a client for the user with keypair seed `seed`.
    ///
    /// Returns the user's wallet address alongside the client.
    pub fn client(&self, seed: u8) -> (Address, TestClient) {
        self.client_with_policy(seed, MembershipPolicy)
    }

    /// Build a client with a non-default decrypt policy.
    pub fn client_with_policy<P: DecryptPolicy>(
        &self,
        seed: u8,
        policy: P,
    ) -> (Address, MessagingClient<MemoryLedger, FlakyStorage, P, MemoryCache>) {
        let signer = Arc::new(KeypairSigner::from_seed(&[seed; 32]));
        let address = signer.address();
        let sessions = Arc::new(SessionKeys::new(
            Arc::clone(&self.cache),
            signer as Arc<dyn ChallengeSigner>,
            Arc::clone(&self.clock) as Arc<dyn Clock>,
        ));
        let client = MessagingClient::new(
            Arc::clone(&self.ledger),
            Arc::clone(&self.storage),
            policy,
            sessions,
            self.config.clone(),
        );
        (address, client)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
