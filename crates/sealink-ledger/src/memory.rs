//! In-memory ledger backend.
//!
//! Reference implementation of [`Ledger`] used in tests and local
//! development. All channel mutations go through a single write lock, so
//! per-channel serialization and atomicity hold trivially.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::RngCore;
use tracing::debug;

use sealink_core::{
    Address, AuthRecord, CapId, ChannelId, ChannelRecord, KeyHistoryRecord, KeyVersion, MemberCap,
    MessageRecord, Permission,
};

use crate::error::{ChainError, Result};
use crate::traits::{Ledger, MessagePointer};

/// Everything the chain holds for one channel.
struct ChannelState {
    channel: ChannelRecord,
    auth: AuthRecord,
    key_history: KeyHistoryRecord,
    /// Accepted message pointers. `seq` of `messages[i]` is `i + 1`.
    messages: Vec<MessageRecord>,
    /// The live cap per current member. Revoked caps are removed here and
    /// from the global cap table in the same transition.
    caps_by_member: HashMap<Address, CapId>,
}

struct Inner {
    channels: HashMap<ChannelId, ChannelState>,
    /// Every cap the ledger has issued and not invalidated.
    caps: HashMap<CapId, (ChannelId, Address)>,
}

/// An in-memory [`Ledger`].
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                channels: HashMap::new(),
                caps: HashMap::new(),
            }),
        }
    }

    fn mint_cap_id() -> CapId {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        CapId::from_bytes(bytes)
    }

    fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    /// Resolve a cap against the cap table and the channel's current auth.
    ///
    /// A cap that was never issued, has been invalidated, or does not match
    /// its claimed channel and member fails with `CapRevoked`. A live cap
    /// whose holder lacks `needed` fails with `Rejected`.
    fn authorize<'a>(
        inner: &'a mut Inner,
        cap: &MemberCap,
        needed: Permission,
    ) -> Result<&'a mut ChannelState> {
        match inner.caps.get(&cap.cap_id) {
            Some((channel_id, member))
                if *channel_id == cap.channel_id && *member == cap.member => {}
            _ => return Err(ChainError::CapRevoked),
        }
        let state = inner
            .channels
            .get_mut(&cap.channel_id)
            .ok_or_else(|| ChainError::ObjectNotFound(cap.channel_id.to_hex()))?;
        if !state.auth.is_member(&cap.member) {
            return Err(ChainError::CapRevoked);
        }
        if !state.auth.has_permission(&cap.member, needed) {
            return Err(ChainError::Rejected(format!(
                "member {} lacks {:?}",
                cap.member, needed
            )));
        }
        Ok(state)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn create_channel(
        &self,
        creator: Address,
        members: Vec<Address>,
        initial_key: Vec<u8>,
    ) -> Result<(ChannelRecord, Vec<MemberCap>)> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);
        let id = ChannelId::derive(&creator, &nonce);

        let now = Self::now_ms();
        let channel = ChannelRecord {
            id,
            messages_count: 0,
            created_at_ms: now,
            updated_at_ms: now,
            last_message_summary: None,
        };
        let auth = AuthRecord::initial(creator, &members);

        let mut caps_by_member = HashMap::new();
        let mut caps = Vec::new();
        for member in auth.members() {
            let cap_id = Self::mint_cap_id();
            inner.caps.insert(cap_id, (id, *member));
            caps_by_member.insert(*member, cap_id);
            caps.push(MemberCap {
                cap_id,
                channel_id: id,
                member: *member,
            });
        }

        debug!(channel = %id, members = caps.len(), "channel created");
        inner.channels.insert(
            id,
            ChannelState {
                channel: channel.clone(),
                auth,
                key_history: KeyHistoryRecord::initial(initial_key),
                messages: Vec::new(),
                caps_by_member,
            },
        );

        Ok((channel, caps))
    }

    async fn channel(&self, id: &ChannelId) -> Result<ChannelRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .channels
            .get(id)
            .map(|s| s.channel.clone())
            .ok_or_else(|| ChainError::ObjectNotFound(id.to_hex()))
    }

    async fn auth(&self, id: &ChannelId) -> Result<AuthRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .channels
            .get(id)
            .map(|s| s.auth.clone())
            .ok_or_else(|| ChainError::ObjectNotFound(id.to_hex()))
    }

    async fn key_history(&self, id: &ChannelId) -> Result<KeyHistoryRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .channels
            .get(id)
            .map(|s| s.key_history.clone())
            .ok_or_else(|| ChainError::ObjectNotFound(id.to_hex()))
    }

    async fn append_message(&self, cap: &MemberCap, pointer: MessagePointer) -> Result<u64> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let state = Self::authorize(&mut inner, cap, Permission::SendMessage)?;

        let seq = state.messages.len() as u64 + 1;
        state.messages.push(MessageRecord {
            sender: pointer.sender,
            key_version: pointer.key_version,
            payload_ref: pointer.payload_ref,
            created_at_ms: pointer.created_at_ms,
            seq,
        });
        state.channel.messages_count += 1;
        state.channel.updated_at_ms = pointer.created_at_ms;
        state.channel.last_message_summary = pointer.summary;

        debug!(channel = %cap.channel_id, seq, "message appended");
        Ok(seq)
    }

    async fn messages_after(
        &self,
        id: &ChannelId,
        after_seq: u64,
        limit: usize,
    ) -> Result<Vec<MessageRecord>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let state = inner
            .channels
            .get(id)
            .ok_or_else(|| ChainError::ObjectNotFound(id.to_hex()))?;
        // seq is the 1-based position, so after_seq is also the skip count.
        Ok(state
            .messages
            .iter()
            .skip(after_seq as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn rotate_key(&self, cap: &MemberCap, new_key: Vec<u8>) -> Result<KeyVersion> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let state = Self::authorize(&mut inner, cap, Permission::RotateKey)?;
        let version = state.key_history.install(new_key);
        debug!(channel = %cap.channel_id, %version, "key rotated");
        Ok(version)
    }

    async fn grant(
        &self,
        cap: &MemberCap,
        member: Address,
        tags: BTreeSet<Permission>,
    ) -> Result<MemberCap> {
        if tags.is_empty() {
            return Err(ChainError::Rejected("grant with no permission tags".into()));
        }
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let state = Self::authorize(&mut inner, cap, Permission::EditMembers)?;
        state.auth.grant(member, tags);

        // A member granted additional tags keeps their existing cap.
        if let Some(existing) = state.caps_by_member.get(&member) {
            return Ok(MemberCap {
                cap_id: *existing,
                channel_id: cap.channel_id,
                member,
            });
        }

        let cap_id = Self::mint_cap_id();
        state.caps_by_member.insert(member, cap_id);
        inner.caps.insert(cap_id, (cap.channel_id, member));
        debug!(channel = %cap.channel_id, member = %member, "member granted");
        Ok(MemberCap {
            cap_id,
            channel_id: cap.channel_id,
            member,
        })
    }

    async fn revoke(&self, cap: &MemberCap, member: &Address) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let state = Self::authorize(&mut inner, cap, Permission::EditMembers)?;
        if !state.auth.is_member(member) {
            return Err(ChainError::Rejected(format!("{member} is not a member")));
        }
        state.auth.revoke(member);
        if let Some(cap_id) = state.caps_by_member.remove(member) {
            inner.caps.remove(&cap_id);
        }
        debug!(channel = %cap.channel_id, member = %member, "member revoked");
        Ok(())
    }

    async fn channels_for_member(&self, address: &Address) -> Result<Vec<ChannelRecord>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut channels: Vec<ChannelRecord> = inner
            .channels
            .values()
            .filter(|s| s.auth.is_member(address))
            .map(|s| s.channel.clone())
            .collect();
        // Most recently active first, channel id as a stable tie-break.
        channels.sort_by(|a, b| b.updated_at_ms.cmp(&a.updated_at_ms).then(a.id.cmp(&b.id)));
        Ok(channels)
    }
}
