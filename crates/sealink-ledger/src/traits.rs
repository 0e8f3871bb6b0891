//! Ledger trait: the consumption boundary between sealink and the chain.
//!
//! The ledger is an external collaborator. sealink only ever reads objects
//! by id and submits transactions; each trait method below maps to exactly
//! one of those. Binary encoding of the records themselves is the fixed
//! codec in `sealink-core` and never leaks past this boundary.

use std::collections::BTreeSet;

use async_trait::async_trait;

use sealink_core::{
    Address, AuthRecord, BlobRef, ChannelId, ChannelRecord, KeyHistoryRecord, KeyVersion,
    MemberCap, MessageRecord, Permission,
};

use crate::error::Result;

/// A message pointer as submitted by a sender, before the chain assigns
/// its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePointer {
    /// Who is sending.
    pub sender: Address,
    /// The key-history version the payload was sealed under.
    pub key_version: KeyVersion,
    /// Reference to the uploaded payload blob.
    pub payload_ref: BlobRef,
    /// Sender-reported creation time (Unix ms).
    pub created_at_ms: i64,
    /// Plaintext summary for the channel list view.
    pub summary: Option<String>,
}

/// The Ledger trait: async interface to the chain.
///
/// # Design Notes
///
/// - **Atomic transitions**: every mutating method is a single transaction;
///   it either fully applies (pointer + counters, rotation append + install,
///   grant + cap mint) or not at all. Cancelling a caller before the method
///   resolves leaves no partial state.
/// - **Per-channel serialization**: implementations must not let two
///   mutations for the same channel interleave; sequence numbers are
///   strictly increasing and gap-free per channel.
/// - **Capability gating**: mutating methods authenticate by [`MemberCap`],
///   not by sender address. A cap the ledger did not issue, or one it has
///   invalidated, fails with [`CapRevoked`](crate::ChainError::CapRevoked).
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Create a channel with its initial auth and version-1 key history,
    /// atomically. Returns the channel plus one freshly minted cap per
    /// member (creator included).
    async fn create_channel(
        &self,
        creator: Address,
        members: Vec<Address>,
        initial_key: Vec<u8>,
    ) -> Result<(ChannelRecord, Vec<MemberCap>)>;

    /// Read a channel object.
    async fn channel(&self, id: &ChannelId) -> Result<ChannelRecord>;

    /// Read a channel's auth object.
    async fn auth(&self, id: &ChannelId) -> Result<AuthRecord>;

    /// Read a channel's key-history object.
    async fn key_history(&self, id: &ChannelId) -> Result<KeyHistoryRecord>;

    /// Append a message pointer and bump `messages_count` /
    /// `updated_at_ms` / `last_message_summary` in one transition.
    /// Returns the chain-assigned sequence number.
    ///
    /// Requires a valid cap whose member holds
    /// [`Permission::SendMessage`].
    async fn append_message(&self, cap: &MemberCap, pointer: MessagePointer) -> Result<u64>;

    /// Read message pointers with `seq > after_seq`, ascending, at most
    /// `limit` of them.
    async fn messages_after(
        &self,
        id: &ChannelId,
        after_seq: u64,
        limit: usize,
    ) -> Result<Vec<MessageRecord>>;

    /// Retire the current latest key into history and install `new_key`
    /// at the next version, in one transition. Returns the new version.
    ///
    /// Requires a valid cap whose member holds [`Permission::RotateKey`].
    async fn rotate_key(&self, cap: &MemberCap, new_key: Vec<u8>) -> Result<KeyVersion>;

    /// Grant permission tags to a member, minting (or returning) their
    /// cap. Requires [`Permission::EditMembers`].
    async fn grant(
        &self,
        cap: &MemberCap,
        member: Address,
        tags: BTreeSet<Permission>,
    ) -> Result<MemberCap>;

    /// Remove every tag for a member, ending membership and invalidating
    /// their cap, in one transition. Requires [`Permission::EditMembers`].
    async fn revoke(&self, cap: &MemberCap, member: &Address) -> Result<()>;

    /// All channels where `address` currently holds membership.
    async fn channels_for_member(&self, address: &Address) -> Result<Vec<ChannelRecord>>;
}
