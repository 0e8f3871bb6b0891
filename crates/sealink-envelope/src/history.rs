//! Key history resolution and rotation.
//!
//! The channel owns an append-only [`KeyHistoryRecord`]; this module turns
//! it into usable wrap keys and performs rotations that never invalidate
//! historical versions.

use sealink_core::{ChannelId, KeyHistoryRecord, KeyVersion};

use crate::crypto::EncryptionKey;
use crate::error::{EnvelopeError, Result};

/// Resolve the wrap key for a given key version.
///
/// Checks `latest` first, then the history log. An absent version is a
/// retention-invariant violation and is logged loudly before surfacing.
pub fn resolve_wrap_key(
    channel_id: &ChannelId,
    history: &KeyHistoryRecord,
    version: KeyVersion,
) -> Result<EncryptionKey> {
    let key_bytes = history.lookup(version).ok_or_else(|| {
        tracing::error!(
            channel = %channel_id,
            %version,
            latest = %history.latest_version,
            "key version missing from history; retention invariant violated"
        );
        EnvelopeError::KeyVersionNotFound(version)
    })?;
    Ok(derive_wrap_key(key_bytes, channel_id, version))
}

/// Generate a fresh channel key and install it as the new latest version.
///
/// The previous latest is appended to the history log first, so every
/// message sealed under it stays decryptable. Returns the new version.
pub fn rotate(history: &mut KeyHistoryRecord) -> KeyVersion {
    let new_key = EncryptionKey::generate();
    let version = history.install(new_key.as_bytes().to_vec());
    tracing::debug!(%version, "rotated channel encryption key");
    version
}

/// Derive the content-key wrap key from channel key material.
///
/// Domain-separated per (channel, version) so key bytes reused across
/// channels or versions never yield the same wrap key.
fn derive_wrap_key(
    channel_key: &[u8],
    channel_id: &ChannelId,
    version: KeyVersion,
) -> EncryptionKey {
    let mut hasher = blake3::Hasher::new_derive_key("sealink-v1-envelope-wrap");
    hasher.update(channel_key);
    hasher.update(channel_id.as_bytes());
    hasher.update(&version.0.to_be_bytes());
    EncryptionKey::from_bytes(*hasher.finalize().as_bytes())
}
