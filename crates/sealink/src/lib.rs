//! # sealink
//!
//! End-to-end encrypted channel messaging over a public ledger.
//!
//! ## Overview
//!
//! sealink lets wallet-holding users exchange encrypted messages in
//! membership-gated channels. The chain stores only metadata and message
//! pointers; encrypted payloads live in off-chain blob storage, and keys
//! never leave the client side.
//!
//! ## Key Concepts
//!
//! - **Session key**: a time-boxed, wallet-signed credential that
//!   authorizes decryption; cached so one signature covers a whole session.
//! - **Sealed envelope**: each message is encrypted under a fresh content
//!   key, itself sealed under the channel key version current at send time.
//! - **Key rotation**: installs a new latest version without invalidating
//!   history, so old messages keep decrypting.
//! - **Member capability**: unforgeable on-chain proof of membership; every
//!   send, rotation, and membership edit presents one.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sealink::{ClientConfig, MembershipPolicy, MessagingClient, PackageConfig};
//! use sealink::cache::MemoryCache;
//! use sealink::ledger::MemoryLedger;
//! use sealink::session::{ChallengeSigner, KeypairSigner, SessionKeys, SystemClock};
//! use sealink::storage::MemoryStorage;
//!
//! async fn example() {
//!     let signer = Arc::new(KeypairSigner::generate());
//!     let me = signer.address();
//!
//!     let sessions = Arc::new(SessionKeys::new(
//!         Arc::new(MemoryCache::new()),
//!         signer,
//!         Arc::new(SystemClock),
//!     ));
//!     let client = MessagingClient::new(
//!         Arc::new(MemoryLedger::new()),
//!         Arc::new(MemoryStorage::new()),
//!         MembershipPolicy,
//!         sessions,
//!         ClientConfig::from(&PackageConfig::testnet()),
//!     );
//!
//!     let friend = "0x".to_string() + &"ab".repeat(32);
//!     let created = client.create_channel(me, &[friend]).await.unwrap();
//!     let cap = created.cap_for(&me).unwrap();
//!
//!     client.send_message(cap, b"hello").await.unwrap();
//!     let page = client.fetch_messages(cap, None).await.unwrap();
//!     assert_eq!(page.messages[0].content.text(), Some("hello"));
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `sealink::core` - identifiers and the on-chain record schema
//! - `sealink::cache` - the credential cache (memory and SQLite)
//! - `sealink::storage` - the payload storage contract
//! - `sealink::envelope` - sealed-envelope encryption and key history
//! - `sealink::session` - session-key lifecycle
//! - `sealink::ledger` - the chain contract

pub mod client;
pub mod config;
pub mod error;
pub mod policy;

// Re-export component crates
pub use sealink_cache as cache;
pub use sealink_core as core;
pub use sealink_envelope as envelope;
pub use sealink_ledger as ledger;
pub use sealink_session as session;
pub use sealink_storage as storage;

// Re-export main types for convenience
pub use client::{
    ChannelMember, CreatedChannel, FetchedMessage, MessageContent, MessagePage, MessagingClient,
    SendReceipt,
};
pub use config::{ClientConfig, PackageConfig, DEFAULT_PAGE_SIZE, DEFAULT_SESSION_TTL_MINUTES};
pub use error::{ClientError, Result};
pub use policy::{DecryptPolicy, DecryptRequest, MembershipPolicy, PolicyVerdict};

// Re-export commonly used core types
pub use sealink_core::{
    Address, AuthRecord, BlobRef, CapId, ChannelId, ChannelRecord, Cursor, KeyHistoryRecord,
    KeyVersion, MemberCap, MessageRecord, Permission,
};
