//! Decrypt-policy authorization.
//!
//! Before the client opens any envelope it asks a [`DecryptPolicy`] whether
//! this caller may decrypt under this key version. The policy stands in for
//! the external approval service; the default [`MembershipPolicy`] evaluates
//! the on-chain auth record locally.

use async_trait::async_trait;

use sealink_core::{AuthRecord, ChannelId, KeyVersion, MemberCap};
use sealink_session::SessionKey;

/// One decrypt-authorization question.
#[derive(Debug)]
pub struct DecryptRequest<'a> {
    /// The channel being read.
    pub channel_id: &'a ChannelId,
    /// The channel's current auth record.
    pub auth: &'a AuthRecord,
    /// The caller's active session key.
    pub session: &'a SessionKey,
    /// The caller's membership capability.
    pub cap: &'a MemberCap,
    /// The key version the messages were sealed under.
    pub key_version: KeyVersion,
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyVerdict {
    /// Decryption may proceed.
    Allow,
    /// Decryption is denied. The reason is surfaced to the caller verbatim
    /// and the request is never retried automatically.
    Deny(String),
}

/// The external decrypt-policy evaluator.
#[async_trait]
pub trait DecryptPolicy: Send + Sync {
    /// Evaluate one decrypt request.
    async fn evaluate(&self, request: DecryptRequest<'_>) -> PolicyVerdict;
}

/// Default policy: the session owner must hold the presented cap and be a
/// current channel member.
#[derive(Debug, Default, Clone, Copy)]
pub struct MembershipPolicy;

#[async_trait]
impl DecryptPolicy for MembershipPolicy {
    async fn evaluate(&self, request: DecryptRequest<'_>) -> PolicyVerdict {
        if request.cap.channel_id != *request.channel_id {
            return PolicyVerdict::Deny("capability is for another channel".into());
        }
        if request.session.owner() != request.cap.member {
            return PolicyVerdict::Deny("session owner does not hold this capability".into());
        }
        if !request.auth.is_member(&request.cap.member) {
            return PolicyVerdict::Deny("no current channel membership".into());
        }
        PolicyVerdict::Allow
    }
}
