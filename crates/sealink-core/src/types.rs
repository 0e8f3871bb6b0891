//! Strong type definitions for sealink.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte account address, written as `0x` followed by 64 hex characters.
///
/// Addresses identify channel members and message senders. They are opaque
/// to sealink: the ledger owns the address scheme, sealink only validates
/// the textual form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create a new Address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from the canonical `0x`-prefixed hex form.
    ///
    /// Returns [`CoreError::InvalidAddress`] for anything that is not
    /// exactly `0x` + 64 hex characters.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| CoreError::InvalidAddress(s.to_string()))?;
        if hex_part.len() != 64 {
            return Err(CoreError::InvalidAddress(s.to_string()));
        }
        let bytes = hex::decode(hex_part).map_err(|_| CoreError::InvalidAddress(s.to_string()))?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The canonical textual form: `0x` + 64 hex characters.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// The zero address (used as a sentinel in tests).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", &hex::encode(self.0)[..16])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 32-byte channel identifier, assigned by the ledger at creation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub [u8; 32]);

impl ChannelId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive a channel id from the creator address and a creation nonce.
    ///
    /// Content-addressed so two creations never collide.
    pub fn derive(creator: &Address, nonce: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key("sealink-v1-channel-id");
        hasher.update(creator.as_bytes());
        hasher.update(nonce);
        Self(*hasher.finalize().as_bytes())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// A 32-byte capability identifier.
///
/// Cap ids are minted by the ledger and are the unforgeable part of a
/// [`MemberCap`](crate::records::MemberCap): the ledger only honors
/// operations presenting a cap id it issued and has not invalidated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapId(pub [u8; 32]);

impl CapId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapId({})", &self.to_hex()[..16])
    }
}

/// An opaque reference to an off-chain payload blob.
///
/// Minted by the storage backend on upload; sealink never inspects it
/// beyond equality and transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef(String);

impl BlobRef {
    /// Wrap a backend-issued reference string.
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    /// The backend-issued reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A channel encryption key version.
///
/// Starts at 1 and strictly increases on every rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyVersion(pub u32);

impl KeyVersion {
    /// The version assigned to a channel's initial key.
    pub const FIRST: Self = Self(1);

    /// The version installed by the next rotation.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for KeyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An opaque pagination cursor.
///
/// The cursor is the chain sequence number of the last message returned,
/// a strictly-increasing position marker rather than a snapshot index:
/// resuming from it can never skip or duplicate a message even while other
/// members keep sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cursor(pub u64);

impl Cursor {
    /// The position after which this cursor resumes.
    pub const fn position(self) -> u64 {
        self.0
    }
}
