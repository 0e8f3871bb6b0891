//! The on-chain record schema.
//!
//! These structs mirror the ledger's object layout for channels, membership,
//! key history, and message pointers. Their CBOR encoding is a fixed,
//! version-pinned wire contract shared with the on-chain package: the field
//! set and order must never be hand-tuned independently of it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Address, BlobRef, CapId, ChannelId, KeyVersion};

/// A permission tag held by a channel member.
///
/// An address with at least one tag is a member; removing the last tag
/// revokes membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// May send messages to the channel.
    SendMessage,
    /// May rotate the channel encryption key.
    RotateKey,
    /// May grant and revoke membership.
    EditMembers,
}

impl Permission {
    /// Every tag, as granted to a channel creator.
    pub const ALL: [Permission; 3] = [
        Permission::SendMessage,
        Permission::RotateKey,
        Permission::EditMembers,
    ];
}

/// Channel metadata maintained by the ledger.
///
/// `messages_count`, `updated_at_ms`, and `last_message_summary` are bumped
/// as a side effect of every accepted send, in the same atomic transition
/// that appends the message pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// The channel identifier.
    pub id: ChannelId,
    /// Number of messages accepted so far.
    pub messages_count: u64,
    /// Creation time (Unix ms).
    pub created_at_ms: i64,
    /// Last mutation time (Unix ms).
    pub updated_at_ms: i64,
    /// Short plaintext summary of the latest message, for list views.
    ///
    /// `None` until the first send. Summaries are supplied by the sender
    /// and are not confidential.
    pub last_message_summary: Option<String>,
}

/// Channel membership and permissions.
///
/// Mutated only through capability-gated grant/revoke transitions, never by
/// direct field writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    /// Permission tags per member address. Empty tag sets are never stored.
    pub member_permissions: BTreeMap<Address, BTreeSet<Permission>>,
    /// Version of the policy config blob this record was written under.
    pub config_version: u32,
}

impl AuthRecord {
    /// Build the initial auth record for a new channel.
    ///
    /// The creator receives every tag; listed members receive `SendMessage`.
    pub fn initial(creator: Address, members: &[Address]) -> Self {
        let mut member_permissions = BTreeMap::new();
        member_permissions.insert(creator, Permission::ALL.into_iter().collect());
        for member in members {
            if *member != creator {
                member_permissions.insert(*member, BTreeSet::from([Permission::SendMessage]));
            }
        }
        Self {
            member_permissions,
            config_version: 1,
        }
    }

    /// Whether the address holds at least one permission tag.
    pub fn is_member(&self, address: &Address) -> bool {
        self.member_permissions.contains_key(address)
    }

    /// Whether the address holds a specific tag.
    pub fn has_permission(&self, address: &Address, permission: Permission) -> bool {
        self.member_permissions
            .get(address)
            .is_some_and(|tags| tags.contains(&permission))
    }

    /// All current member addresses.
    pub fn members(&self) -> impl Iterator<Item = &Address> {
        self.member_permissions.keys()
    }

    /// Grant tags to an address. An empty tag set is a no-op: membership
    /// is only ever created with at least one tag.
    pub fn grant(&mut self, address: Address, tags: BTreeSet<Permission>) {
        if tags.is_empty() {
            return;
        }
        self.member_permissions.entry(address).or_default().extend(tags);
    }

    /// Remove every tag for an address, ending its membership.
    pub fn revoke(&mut self, address: &Address) {
        self.member_permissions.remove(address);
    }
}

/// The channel's rotating encryption key history.
///
/// Append-only: rotation pushes the old `latest` into `history` before
/// installing the new key, so every version ever issued stays retrievable
/// for as long as any message references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyHistoryRecord {
    /// Key bytes for the latest version.
    pub latest: Vec<u8>,
    /// The latest version. Strictly increases on rotation.
    pub latest_version: KeyVersion,
    /// Prior `(version, key bytes)` pairs, oldest first.
    pub history: Vec<(KeyVersion, Vec<u8>)>,
}

impl KeyHistoryRecord {
    /// Build the version-1 history for a new channel.
    pub fn initial(key: Vec<u8>) -> Self {
        Self {
            latest: key,
            latest_version: KeyVersion::FIRST,
            history: Vec::new(),
        }
    }

    /// Look up the key bytes for a version, checking `latest` first.
    ///
    /// Returns `None` only if the version was never issued or the retention
    /// invariant has been violated; callers treat the latter as a hard
    /// internal-consistency fault.
    pub fn lookup(&self, version: KeyVersion) -> Option<&[u8]> {
        if version == self.latest_version {
            return Some(&self.latest);
        }
        self.history
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, key)| key.as_slice())
    }

    /// Install a new latest key, retiring the current one into history.
    pub fn install(&mut self, new_key: Vec<u8>) -> KeyVersion {
        let retired = std::mem::replace(&mut self.latest, new_key);
        self.history.push((self.latest_version, retired));
        self.latest_version = self.latest_version.next();
        self.latest_version
    }
}

/// An on-chain message pointer.
///
/// Immutable once created. The payload itself lives off-chain behind
/// `payload_ref`; the pointer carries only what is needed to locate and
/// decrypt it. `seq` is strictly increasing per channel and defines the
/// delivery order; `created_at_ms` is sender-reported metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Who sent the message.
    pub sender: Address,
    /// The key history version the content key was sealed under.
    pub key_version: KeyVersion,
    /// Opaque reference to the encrypted payload blob.
    pub payload_ref: BlobRef,
    /// Sender-reported creation time (Unix ms).
    pub created_at_ms: i64,
    /// Chain-assigned per-channel sequence number (tie-break and cursor).
    pub seq: u64,
}

/// Unforgeable proof of channel membership.
///
/// Issued by the ledger at channel creation or grant time, one per
/// (channel, member). Required input to every send, rotation, membership
/// edit, and decrypt-authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCap {
    /// The ledger-minted capability id.
    pub cap_id: CapId,
    /// The channel this capability is scoped to.
    pub channel_id: ChannelId,
    /// The member it was issued to.
    pub member: Address,
}

macro_rules! cbor_codec {
    ($ty:ty) => {
        impl $ty {
            /// Serialize to the fixed CBOR wire form.
            pub fn to_bytes(&self) -> Vec<u8> {
                let mut buf = Vec::new();
                ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
                buf
            }

            /// Deserialize from the fixed CBOR wire form.
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
                ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
            }
        }
    };
}

cbor_codec!(ChannelRecord);
cbor_codec!(AuthRecord);
cbor_codec!(KeyHistoryRecord);
cbor_codec!(MessageRecord);
cbor_codec!(MemberCap);

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    #[test]
    fn test_auth_initial_membership() {
        let creator = addr(1);
        let auth = AuthRecord::initial(creator, &[addr(2), addr(3)]);

        assert!(auth.is_member(&creator));
        assert!(auth.is_member(&addr(2)));
        assert!(auth.is_member(&addr(3)));
        assert!(!auth.is_member(&addr(4)));

        assert!(auth.has_permission(&creator, Permission::RotateKey));
        assert!(auth.has_permission(&addr(2), Permission::SendMessage));
        assert!(!auth.has_permission(&addr(2), Permission::RotateKey));
    }

    #[test]
    fn test_auth_creator_in_member_list_keeps_full_tags() {
        let creator = addr(1);
        let auth = AuthRecord::initial(creator, &[creator, addr(2)]);
        assert!(auth.has_permission(&creator, Permission::EditMembers));
    }

    #[test]
    fn test_auth_revoke_ends_membership() {
        let creator = addr(1);
        let mut auth = AuthRecord::initial(creator, &[addr(2)]);

        auth.revoke(&addr(2));
        assert!(!auth.is_member(&addr(2)));
        assert!(!auth.has_permission(&addr(2), Permission::SendMessage));
    }

    #[test]
    fn test_auth_grant_empty_tags_is_noop() {
        let creator = addr(1);
        let mut auth = AuthRecord::initial(creator, &[]);

        auth.grant(addr(9), BTreeSet::new());
        assert!(!auth.is_member(&addr(9)));
    }

    #[test]
    fn test_key_history_lookup_latest_and_prior() {
        let mut history = KeyHistoryRecord::initial(vec![1; 32]);
        assert_eq!(history.lookup(KeyVersion::FIRST), Some(&[1u8; 32][..]));

        let v2 = history.install(vec![2; 32]);
        assert_eq!(v2, KeyVersion(2));
        assert_eq!(history.latest_version, KeyVersion(2));
        assert_eq!(history.lookup(KeyVersion(2)), Some(&[2u8; 32][..]));
        assert_eq!(history.lookup(KeyVersion(1)), Some(&[1u8; 32][..]));
        assert_eq!(history.lookup(KeyVersion(3)), None);
    }

    #[test]
    fn test_key_history_install_is_append_only() {
        let mut history = KeyHistoryRecord::initial(vec![1; 32]);
        for i in 2..=5u8 {
            history.install(vec![i; 32]);
        }
        assert_eq!(history.history.len(), 4);
        // Every version ever issued remains retrievable.
        for i in 1..=5u8 {
            assert_eq!(
                history.lookup(KeyVersion(u32::from(i))),
                Some(&[i; 32][..])
            );
        }
    }

    #[test]
    fn test_record_cbor_roundtrip() {
        let record = MessageRecord {
            sender: addr(7),
            key_version: KeyVersion(3),
            payload_ref: BlobRef::new("blob-abc"),
            created_at_ms: 1_700_000_000_000,
            seq: 42,
        };
        let bytes = record.to_bytes();
        let recovered = MessageRecord::from_bytes(&bytes).unwrap();
        assert_eq!(record, recovered);
    }

    #[test]
    fn test_auth_cbor_roundtrip() {
        let auth = AuthRecord::initial(addr(1), &[addr(2)]);
        let recovered = AuthRecord::from_bytes(&auth.to_bytes()).unwrap();
        assert_eq!(auth, recovered);
    }
}
