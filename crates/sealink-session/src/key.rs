//! The session key: a time-boxed, wallet-signed decrypt-authorization
//! credential.
//!
//! State machine: Unissued → Pending (challenge out for signing) → Active
//! (signed, within TTL) → Expired | Revoked. Only Active keys may authorize
//! decryption. A rejected signature returns to Unissued without caching.

use serde::{Deserialize, Serialize};

use sealink_core::Address;

/// A per-(address, scope) session key.
///
/// Created unsigned (`Pending`); becomes usable once the wallet signature
/// is attached and only while `now < creation_time_ms + ttl_minutes *
/// 60_000`. The expiry boundary is inclusive: at exactly the expiry instant
/// the key is already expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    owner: Address,
    scope_package: Address,
    ttl_minutes: u32,
    creation_time_ms: i64,
    challenge_nonce: [u8; 16],
    signature: Option<Vec<u8>>,
}

impl SessionKey {
    /// Construct a fresh, unsigned key (the `Pending` state).
    pub fn new(owner: Address, scope_package: Address, ttl_minutes: u32, now_ms: i64) -> Self {
        let mut challenge_nonce = [0u8; 16];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut challenge_nonce);
        Self {
            owner,
            scope_package,
            ttl_minutes,
            creation_time_ms: now_ms,
            challenge_nonce,
            signature: None,
        }
    }

    /// The address this key authorizes.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The on-chain package this key is scoped to.
    pub fn scope_package(&self) -> Address {
        self.scope_package
    }

    /// Time-to-live in minutes.
    pub fn ttl_minutes(&self) -> u32 {
        self.ttl_minutes
    }

    /// When the key was created (Unix ms).
    pub fn creation_time_ms(&self) -> i64 {
        self.creation_time_ms
    }

    /// The instant at which this key stops being usable.
    pub fn expires_at_ms(&self) -> i64 {
        self.creation_time_ms + i64::from(self.ttl_minutes) * 60_000
    }

    /// The challenge the wallet is asked to sign.
    ///
    /// Binds owner, scope, creation time, TTL, and a random nonce so a
    /// signature can never be replayed for a different key.
    pub fn challenge(&self) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new_derive_key("sealink-v1-session-challenge");
        hasher.update(self.owner.as_bytes());
        hasher.update(self.scope_package.as_bytes());
        hasher.update(&self.creation_time_ms.to_be_bytes());
        hasher.update(&self.ttl_minutes.to_be_bytes());
        hasher.update(&self.challenge_nonce);
        hasher.finalize().as_bytes().to_vec()
    }

    /// Attach the wallet signature, moving Pending → Active.
    pub fn attach_signature(&mut self, signature: Vec<u8>) {
        self.signature = Some(signature);
    }

    /// The wallet signature, once attached.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// Whether this key may authorize decryption at `now`.
    ///
    /// Requires both a populated signature and an unexpired TTL; equality
    /// with the expiry instant counts as expired.
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.signature.is_some() && now_ms < self.expires_at_ms()
    }

    /// Export a snapshot for persistence.
    pub fn export(&self) -> ExportedSessionKey {
        ExportedSessionKey {
            owner: self.owner,
            scope_package: self.scope_package,
            ttl_minutes: self.ttl_minutes,
            creation_time_ms: self.creation_time_ms,
            challenge_nonce: self.challenge_nonce,
            signature: self.signature.clone(),
        }
    }

    /// Rebuild a key from an exported snapshot.
    pub fn from_exported(exported: ExportedSessionKey) -> Self {
        Self {
            owner: exported.owner,
            scope_package: exported.scope_package,
            ttl_minutes: exported.ttl_minutes,
            creation_time_ms: exported.creation_time_ms,
            challenge_nonce: exported.challenge_nonce,
            signature: exported.signature,
        }
    }
}

/// Serializable snapshot of a session key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedSessionKey {
    /// The address this key authorizes.
    pub owner: Address,
    /// The on-chain package this key is scoped to.
    pub scope_package: Address,
    /// Time-to-live in minutes.
    pub ttl_minutes: u32,
    /// When the key was created (Unix ms).
    pub creation_time_ms: i64,
    /// Nonce baked into the signed challenge.
    pub challenge_nonce: [u8; 16],
    /// The wallet signature, if the key was signed.
    pub signature: Option<Vec<u8>>,
}

/// Current cached-credential schema version.
pub const CREDENTIAL_FORMAT_VERSION: &str = "1.0";

/// The record persisted in the credential cache.
///
/// `format_version` must match [`CREDENTIAL_FORMAT_VERSION`] exactly or the
/// record is discarded unread, never partially trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCredentialRecord {
    /// Schema version of this record.
    pub format_version: String,
    /// The exported session key.
    pub payload: ExportedSessionKey,
    /// When the record was written (Unix ms).
    pub stored_at_ms: i64,
}

impl CachedCredentialRecord {
    /// Wrap an exported key under the current format version.
    pub fn new(payload: ExportedSessionKey, stored_at_ms: i64) -> Self {
        Self {
            format_version: CREDENTIAL_FORMAT_VERSION.to_string(),
            payload,
            stored_at_ms,
        }
    }

    /// Whether this record was written under the current schema.
    pub fn format_matches(&self) -> bool {
        self.format_version == CREDENTIAL_FORMAT_VERSION
    }

    /// Whether the contained key is past its TTL at `now`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        let expires_at =
            self.payload.creation_time_ms + i64::from(self.payload.ttl_minutes) * 60_000;
        now_ms >= expires_at
    }
}
