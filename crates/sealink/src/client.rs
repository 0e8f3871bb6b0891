//! The messaging client: unified API over session, envelope, storage, and
//! ledger.
//!
//! The client owns no channel state. Every operation reads the current
//! on-chain objects, performs the crypto locally, and submits at most one
//! atomic chain transition.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use sealink_cache::KeyValueCache;
use sealink_core::{
    Address, ChannelId, ChannelRecord, Cursor, KeyVersion, MemberCap, Permission,
};
use sealink_envelope::{EncryptionKey, SealedEnvelope};
use sealink_ledger::{Ledger, MessagePointer};
use sealink_session::{SessionKey, SessionKeys};
use sealink_storage::StorageAdapter;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::policy::{DecryptPolicy, DecryptRequest, PolicyVerdict};

/// Maximum characters kept in the plaintext channel-list summary.
const SUMMARY_MAX_CHARS: usize = 80;

/// A newly created channel with the caps minted for its members.
#[derive(Debug, Clone)]
pub struct CreatedChannel {
    /// The channel record as written on-chain.
    pub channel: ChannelRecord,
    /// One cap per member, creator included.
    pub caps: Vec<MemberCap>,
}

impl CreatedChannel {
    /// The cap minted for `member`, if they are one.
    pub fn cap_for(&self, member: &Address) -> Option<&MemberCap> {
        self.caps.iter().find(|c| c.member == *member)
    }
}

/// Receipt returned by a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// The channel written to.
    pub channel_id: ChannelId,
    /// The chain-assigned sequence number.
    pub seq: u64,
    /// The key version the payload was sealed under.
    pub key_version: KeyVersion,
}

/// Decrypted (or degraded) content of one fetched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// The decrypted payload bytes.
    Plaintext(Bytes),
    /// Download or decryption failed for this message only; the rest of
    /// the page is unaffected.
    Unavailable(String),
}

impl MessageContent {
    /// The payload bytes, if decryption succeeded.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            MessageContent::Plaintext(bytes) => Some(bytes),
            MessageContent::Unavailable(_) => None,
        }
    }

    /// The payload as UTF-8 text, if it is both decrypted and valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        self.bytes().and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// One message as returned by a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Who sent it.
    pub sender: Address,
    /// Chain sequence number within the channel.
    pub seq: u64,
    /// Sender-reported creation time (Unix ms).
    pub created_at_ms: i64,
    /// The key version the payload was sealed under.
    pub key_version: KeyVersion,
    /// Decrypted payload or a per-message error placeholder.
    pub content: MessageContent,
}

/// One page of fetched messages.
#[derive(Debug, Clone)]
pub struct MessagePage {
    /// Messages in ascending `seq` order, the channel's delivery order.
    pub messages: Vec<FetchedMessage>,
    /// Cursor for the next page, `None` once the channel is drained.
    pub next_cursor: Option<Cursor>,
}

/// A channel member with their permission tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMember {
    /// The member address.
    pub address: Address,
    /// The tags the member currently holds.
    pub permissions: BTreeSet<Permission>,
}

/// The messaging client.
///
/// Composes the four injected collaborators: a [`Ledger`] for atomic chain
/// transitions, a [`StorageAdapter`] for encrypted payload blobs, a
/// [`DecryptPolicy`] for decrypt authorization, and [`SessionKeys`] for the
/// credential lifecycle. The credential cache inside [`SessionKeys`] is the
/// only shared mutable resource; everything else is read-modify-submit
/// against chain state.
pub struct MessagingClient<L, S, P, C>
where
    L: Ledger,
    S: StorageAdapter,
    P: DecryptPolicy,
    C: KeyValueCache,
{
    ledger: Arc<L>,
    storage: Arc<S>,
    policy: P,
    sessions: Arc<SessionKeys<C>>,
    config: ClientConfig,
}

impl<L, S, P, C> MessagingClient<L, S, P, C>
where
    L: Ledger,
    S: StorageAdapter,
    P: DecryptPolicy,
    C: KeyValueCache,
{
    /// Create a new client.
    pub fn new(
        ledger: Arc<L>,
        storage: Arc<S>,
        policy: P,
        sessions: Arc<SessionKeys<C>>,
        config: ClientConfig,
    ) -> Self {
        Self {
            ledger,
            storage,
            policy,
            sessions,
            config,
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session-key lifecycle manager.
    pub fn sessions(&self) -> &Arc<SessionKeys<C>> {
        &self.sessions
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Channel Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a channel.
    ///
    /// Validates every member address textually before touching the chain,
    /// and rejects an empty member list. On success the creator holds every
    /// permission tag, listed members hold `SendMessage`, and the returned
    /// caps cover exactly {creator} ∪ members.
    pub async fn create_channel(
        &self,
        creator: Address,
        members: &[String],
    ) -> Result<CreatedChannel> {
        if members.is_empty() {
            return Err(ClientError::EmptyMembership);
        }
        let mut parsed = Vec::with_capacity(members.len());
        for member in members {
            parsed.push(Address::parse(member)?);
        }

        let initial_key = EncryptionKey::generate().as_bytes().to_vec();
        let (channel, caps) = self
            .ledger
            .create_channel(creator, parsed, initial_key)
            .await?;
        Ok(CreatedChannel { channel, caps })
    }

    /// Channels where `address` currently holds membership, annotated with
    /// the latest message summary.
    pub async fn list_channels(&self, address: &Address) -> Result<Vec<ChannelRecord>> {
        Ok(self.ledger.channels_for_member(address).await?)
    }

    /// Current members of a channel with their permission tags.
    pub async fn channel_members(&self, channel_id: &ChannelId) -> Result<Vec<ChannelMember>> {
        let auth = self.ledger.auth(channel_id).await?;
        Ok(auth
            .member_permissions
            .iter()
            .map(|(address, permissions)| ChannelMember {
                address: *address,
                permissions: permissions.clone(),
            })
            .collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Messaging Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a message payload to a channel.
    ///
    /// Requires an Active session for the cap holder (issued or loaded from
    /// cache) and current membership. The payload is sealed under the
    /// channel's latest key version and uploaded before anything is
    /// submitted on-chain: an upload failure aborts the send with no
    /// orphaned pointer, and cancellation before the chain write leaves no
    /// partial state.
    pub async fn send_message(&self, cap: &MemberCap, payload: &[u8]) -> Result<SendReceipt> {
        let _session = self.active_session(cap.member).await?;

        let auth = self.ledger.auth(&cap.channel_id).await?;
        if !auth.is_member(&cap.member) {
            return Err(ClientError::NotAMember);
        }

        let history = self.ledger.key_history(&cap.channel_id).await?;
        let envelope = SealedEnvelope::seal(&cap.channel_id, &history, payload)?;
        let key_version = envelope.key_version;

        let payload_ref = self
            .storage
            .upload(Bytes::from(envelope.to_bytes()))
            .await?;

        let pointer = MessagePointer {
            sender: cap.member,
            key_version,
            payload_ref,
            created_at_ms: self.sessions.clock().now_ms(),
            summary: summarize(payload),
        };
        let seq = self.ledger.append_message(cap, pointer).await?;

        Ok(SendReceipt {
            channel_id: cap.channel_id,
            seq,
            key_version,
        })
    }

    /// Fetch one page of messages, decrypted, in ascending `seq` order.
    /// `created_at_ms` is sender-reported metadata and does not affect
    /// ordering.
    ///
    /// Pass `None` to start from the beginning; chain the returned
    /// `next_cursor` to resume. Cursor chaining never skips or duplicates a
    /// message even while other members keep sending. A download or decrypt
    /// failure degrades that message to [`MessageContent::Unavailable`]
    /// without failing the page; a policy denial fails the whole call.
    ///
    /// Callers polling a channel must not overlap fetches for the same
    /// channel from the same poller; interleaved pages from two in-flight
    /// fetches have no meaningful order.
    pub async fn fetch_messages(
        &self,
        cap: &MemberCap,
        cursor: Option<Cursor>,
    ) -> Result<MessagePage> {
        let session = self.active_session(cap.member).await?;

        let channel = self.ledger.channel(&cap.channel_id).await?;
        let auth = self.ledger.auth(&cap.channel_id).await?;
        if !auth.is_member(&cap.member) {
            return Err(ClientError::NotAMember);
        }

        let after_seq = cursor.map(Cursor::position).unwrap_or(0);
        let records = self
            .ledger
            .messages_after(&cap.channel_id, after_seq, self.config.page_size)
            .await?;
        if records.is_empty() {
            return Ok(MessagePage {
                messages: Vec::new(),
                next_cursor: None,
            });
        }

        // One policy evaluation per key version appearing in the page.
        let history = self.ledger.key_history(&cap.channel_id).await?;
        let versions: BTreeSet<KeyVersion> = records.iter().map(|r| r.key_version).collect();
        for key_version in versions {
            let verdict = self
                .policy
                .evaluate(DecryptRequest {
                    channel_id: &cap.channel_id,
                    auth: &auth,
                    session: &session,
                    cap,
                    key_version,
                })
                .await;
            if let PolicyVerdict::Deny(reason) = verdict {
                return Err(ClientError::PolicyDenied(reason));
            }
        }

        let mut messages = Vec::with_capacity(records.len());
        for record in &records {
            let content = match self.open_payload(&cap.channel_id, record, &history).await {
                Ok(bytes) => MessageContent::Plaintext(bytes),
                Err(e) => {
                    warn!(
                        channel = %cap.channel_id,
                        seq = record.seq,
                        error = %e,
                        "message degraded to placeholder"
                    );
                    MessageContent::Unavailable(e.to_string())
                }
            };
            messages.push(FetchedMessage {
                sender: record.sender,
                seq: record.seq,
                created_at_ms: record.created_at_ms,
                key_version: record.key_version,
                content,
            });
        }

        // seq is gap-free, so messages_count is also the highest seq.
        let last_seq = records
            .last()
            .map(|r| r.seq)
            .unwrap_or(after_seq);
        let next_cursor = (last_seq < channel.messages_count).then_some(Cursor(last_seq));

        Ok(MessagePage {
            messages,
            next_cursor,
        })
    }

    async fn open_payload(
        &self,
        channel_id: &ChannelId,
        record: &sealink_core::MessageRecord,
        history: &sealink_core::KeyHistoryRecord,
    ) -> Result<Bytes> {
        let blob = self.storage.download(&record.payload_ref).await?;
        let envelope = SealedEnvelope::from_bytes(&blob)?;
        let plaintext = envelope.open(channel_id, history)?;
        Ok(Bytes::from(plaintext))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key and Membership Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Rotate the channel encryption key.
    ///
    /// Requires the `RotateKey` tag. The retired key stays in history, so
    /// every previously sent message remains decryptable.
    pub async fn rotate_key(&self, cap: &MemberCap) -> Result<KeyVersion> {
        let new_key = EncryptionKey::generate().as_bytes().to_vec();
        Ok(self.ledger.rotate_key(cap, new_key).await?)
    }

    /// Grant permission tags to a member, minting their cap if needed.
    /// Requires the `EditMembers` tag.
    pub async fn grant(
        &self,
        cap: &MemberCap,
        member: Address,
        tags: BTreeSet<Permission>,
    ) -> Result<MemberCap> {
        Ok(self.ledger.grant(cap, member, tags).await?)
    }

    /// Revoke a member, removing all their tags and invalidating their cap.
    /// Requires the `EditMembers` tag.
    pub async fn revoke(&self, cap: &MemberCap, member: &Address) -> Result<()> {
        Ok(self.ledger.revoke(cap, member).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `owner` already has a usable cached session for this
    /// client's scope package (no signing prompt needed).
    pub async fn has_valid_cached_session(&self, owner: Address) -> Result<bool> {
        Ok(self
            .sessions
            .has_valid_cached_session(owner, self.config.scope_package)
            .await?)
    }

    /// Issue or load the Active session for `owner`; everything that
    /// decrypts or sends goes through here first.
    async fn active_session(&self, owner: Address) -> Result<SessionKey> {
        Ok(self
            .sessions
            .issue(
                owner,
                self.config.scope_package,
                self.config.session_ttl_minutes,
            )
            .await?)
    }
}

/// Plaintext summary for the channel list: the payload's leading characters
/// when it is valid UTF-8, nothing otherwise.
fn summarize(payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?;
    Some(text.chars().take(SUMMARY_MAX_CHARS).collect())
}
