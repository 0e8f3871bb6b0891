//! The sealed message envelope.
//!
//! Each message payload is encrypted with a fresh per-message content key;
//! the content key itself is sealed under a wrap key derived from the
//! channel's current key-history version. Rotating the channel key changes
//! which version new envelopes are sealed under without touching old ones.

use serde::{Deserialize, Serialize};

use sealink_core::{ChannelId, KeyHistoryRecord, KeyVersion};

use crate::crypto::{EncryptionKey, EncryptionNonce};
use crate::error::{EnvelopeError, Result};
use crate::history::resolve_wrap_key;

/// A sealed envelope: the off-chain wire form of an encrypted message.
///
/// This is what gets uploaded to blob storage. The `key_version` tag also
/// travels on-chain in the message pointer, which is what makes historical
/// decryption work after any number of rotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// The key-history version the content key is sealed under.
    pub key_version: KeyVersion,

    /// The per-message content key, encrypted under the wrap key.
    pub sealed_key: Vec<u8>,

    /// Nonce used to seal the content key.
    pub seal_nonce: EncryptionNonce,

    /// Nonce used to encrypt the payload.
    pub content_nonce: EncryptionNonce,

    /// The encrypted payload (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl SealedEnvelope {
    /// Encrypt a plaintext for sending.
    ///
    /// Derives a fresh content key, encrypts the plaintext with it, then
    /// seals the content key under the channel's **latest** key version.
    /// No on-chain side effects: the version tag travels with the message
    /// pointer written by the messaging client.
    pub fn seal(
        channel_id: &ChannelId,
        history: &KeyHistoryRecord,
        plaintext: &[u8],
    ) -> Result<Self> {
        let key_version = history.latest_version;
        let wrap_key = resolve_wrap_key(channel_id, history, key_version)?;

        let content_key = EncryptionKey::generate();
        let content_nonce = EncryptionNonce::generate();
        let ciphertext = content_key.encrypt(plaintext, &content_nonce)?;

        let seal_nonce = EncryptionNonce::generate();
        let sealed_key = wrap_key.encrypt(content_key.as_bytes(), &seal_nonce)?;

        Ok(Self {
            key_version,
            sealed_key,
            seal_nonce,
            content_nonce,
            ciphertext,
        })
    }

    /// Decrypt the envelope against the channel's key history.
    ///
    /// Resolves `key_version` (the latest key or any prior version in the
    /// history log) so envelopes sealed before a rotation keep opening.
    /// Authorization (Active session key, member capability, policy check)
    /// is the messaging client's responsibility and happens before this is
    /// called.
    pub fn open(&self, channel_id: &ChannelId, history: &KeyHistoryRecord) -> Result<Vec<u8>> {
        let wrap_key = resolve_wrap_key(channel_id, history, self.key_version)?;

        let key_bytes = wrap_key.decrypt(&self.sealed_key, &self.seal_nonce)?;
        if key_bytes.len() != 32 {
            return Err(EnvelopeError::InvalidKeyLength(key_bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&key_bytes);
        let content_key = EncryptionKey::from_bytes(arr);

        content_key.decrypt(&self.ciphertext, &self.content_nonce)
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
        buf
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| EnvelopeError::Serialization(e.to_string()))
    }
}
