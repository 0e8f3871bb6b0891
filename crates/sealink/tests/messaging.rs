//! End-to-end messaging scenarios against the in-memory backends.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sealink::{
    ClientError, DecryptPolicy, DecryptRequest, KeyVersion, MemberCap, MessageContent, Permission,
    PolicyVerdict,
};
use sealink_core::{BlobRef, CapId};
use sealink_ledger::{Ledger, MessagePointer};
use sealink_session::Clock;
use sealink_testkit::TestFixture;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn test_hello_roundtrip() {
    init_tracing();
    let fixture = TestFixture::new();
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();

    let receipt = client.send_message(cap, b"hello").await.unwrap();
    assert_eq!(receipt.seq, 1);
    assert_eq!(receipt.key_version, KeyVersion::FIRST);

    let page = client.fetch_messages(cap, None).await.unwrap();
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].content.text(), Some("hello"));
    assert_eq!(page.messages[0].sender, alice);
    assert!(page.next_cursor.is_none());

    let channels = client.list_channels(&alice).await.unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].messages_count, 1);
    assert_eq!(channels[0].last_message_summary.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_create_channel_validation() {
    let fixture = TestFixture::new();
    let (alice, client) = fixture.client(1);

    let err = client.create_channel(alice, &[]).await.unwrap_err();
    assert!(matches!(err, ClientError::EmptyMembership));

    let err = client
        .create_channel(alice, &["not-an-address".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidAddress(_)));

    // Nothing reached the chain.
    assert!(client.list_channels(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rotation_spans_versions_and_history_decrypts() {
    let fixture = TestFixture::new();
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();

    client.send_message(cap, b"before rotation").await.unwrap();

    let v2 = client.rotate_key(cap).await.unwrap();
    assert_eq!(v2, KeyVersion(2));

    client.send_message(cap, b"after rotation").await.unwrap();
    client.send_message(cap, b"and another").await.unwrap();

    let page = client.fetch_messages(cap, None).await.unwrap();
    let versions: Vec<KeyVersion> = page.messages.iter().map(|m| m.key_version).collect();
    assert_eq!(versions, vec![KeyVersion(1), KeyVersion(2), KeyVersion(2)]);

    let texts: Vec<&str> = page
        .messages
        .iter()
        .map(|m| m.content.text().unwrap())
        .collect();
    assert_eq!(texts, vec!["before rotation", "after rotation", "and another"]);
}

#[tokio::test]
async fn test_messages_survive_many_rotations() {
    let fixture = TestFixture::new();
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();

    client.send_message(cap, b"earliest").await.unwrap();
    for _ in 0..5 {
        client.rotate_key(cap).await.unwrap();
    }

    let page = client.fetch_messages(cap, None).await.unwrap();
    assert_eq!(page.messages[0].content.text(), Some("earliest"));
}

#[tokio::test]
async fn test_upload_failure_leaves_no_partial_state() {
    init_tracing();
    let fixture = TestFixture::new();
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();

    client.send_message(cap, b"delivered").await.unwrap();

    fixture.storage.fail_uploads(true);
    let err = client.send_message(cap, b"lost").await.unwrap_err();
    assert!(matches!(err, ClientError::Storage(_)));

    // No orphan pointer, counters unchanged.
    let channels = client.list_channels(&alice).await.unwrap();
    assert_eq!(channels[0].messages_count, 1);
    assert_eq!(
        channels[0].last_message_summary.as_deref(),
        Some("delivered")
    );

    // Recovery is a plain retry once the backend is healthy again.
    fixture.storage.fail_uploads(false);
    client.send_message(cap, b"retried").await.unwrap();
    let page = client.fetch_messages(cap, None).await.unwrap();
    assert_eq!(page.messages.len(), 2);
}

#[tokio::test]
async fn test_revoked_member_loses_access() {
    let fixture = TestFixture::new();
    let (alice, alice_client) = fixture.client(1);
    let (bob, bob_client) = fixture.client(2);

    let created = alice_client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let alice_cap = created.cap_for(&alice).unwrap();
    let bob_cap = created.cap_for(&bob).unwrap().clone();

    bob_client
        .send_message(&bob_cap, b"from bob")
        .await
        .unwrap();

    alice_client.revoke(alice_cap, &bob).await.unwrap();

    let err = bob_client
        .send_message(&bob_cap, b"after revoke")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotAMember));

    let err = bob_client
        .fetch_messages(&bob_cap, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotAMember));

    assert!(bob_client.list_channels(&bob).await.unwrap().is_empty());

    // Bob's earlier message is still there for remaining members.
    let page = alice_client.fetch_messages(alice_cap, None).await.unwrap();
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].sender, bob);
}

#[tokio::test]
async fn test_granted_member_can_send() {
    let fixture = TestFixture::new();
    let (alice, alice_client) = fixture.client(1);
    let bob = TestFixture::address(2);
    let (dave, dave_client) = fixture.client(4);

    let created = alice_client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let alice_cap = created.cap_for(&alice).unwrap();
    assert!(created.cap_for(&dave).is_none());

    let dave_cap = alice_client
        .grant(
            alice_cap,
            dave,
            BTreeSet::from([Permission::SendMessage]),
        )
        .await
        .unwrap();

    dave_client
        .send_message(&dave_cap, b"hi from dave")
        .await
        .unwrap();

    let members = alice_client
        .channel_members(&created.channel.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 3);
    let dave_entry = members.iter().find(|m| m.address == dave).unwrap();
    assert_eq!(
        dave_entry.permissions,
        BTreeSet::from([Permission::SendMessage])
    );
}

#[tokio::test]
async fn test_forged_cap_is_not_a_member() {
    let fixture = TestFixture::new();
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();

    let forged = MemberCap {
        cap_id: CapId::from_bytes([0x5a; 32]),
        channel_id: created.channel.id,
        member: alice,
    };
    let err = client.send_message(&forged, b"x").await.unwrap_err();
    assert!(matches!(err, ClientError::NotAMember));
}

#[tokio::test]
async fn test_session_reuse_and_expiry_across_operations() {
    let fixture = TestFixture::new();
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    assert!(!client.has_valid_cached_session(alice).await.unwrap());

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();

    client.send_message(cap, b"first").await.unwrap();
    assert!(client.has_valid_cached_session(alice).await.unwrap());

    // Past the 30-minute TTL the cached credential is gone, but the next
    // operation transparently re-issues.
    fixture.clock.advance_minutes(31);
    assert!(!client.has_valid_cached_session(alice).await.unwrap());

    client.send_message(cap, b"second").await.unwrap();
    assert!(client.has_valid_cached_session(alice).await.unwrap());
}

#[tokio::test]
async fn test_missing_blob_degrades_single_message() {
    let fixture = TestFixture::new();
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();

    client.send_message(cap, b"intact one").await.unwrap();

    // A pointer whose blob never made it to storage (lost off-chain data).
    fixture
        .ledger
        .append_message(
            cap,
            MessagePointer {
                sender: alice,
                key_version: KeyVersion::FIRST,
                payload_ref: BlobRef::new("vanished-blob"),
                created_at_ms: fixture.clock.now_ms(),
                summary: None,
            },
        )
        .await
        .unwrap();

    client.send_message(cap, b"intact two").await.unwrap();

    let page = client.fetch_messages(cap, None).await.unwrap();
    assert_eq!(page.messages.len(), 3);
    assert_eq!(page.messages[0].content.text(), Some("intact one"));
    assert!(matches!(
        page.messages[1].content,
        MessageContent::Unavailable(_)
    ));
    assert_eq!(page.messages[2].content.text(), Some("intact two"));
}

/// Policy that denies everything, standing in for an external approval
/// service saying no.
struct RefuseAll;

#[async_trait]
impl DecryptPolicy for RefuseAll {
    async fn evaluate(&self, _request: DecryptRequest<'_>) -> PolicyVerdict {
        PolicyVerdict::Deny("approval contract refused".into())
    }
}

#[tokio::test]
async fn test_policy_denial_is_surfaced_verbatim() {
    let fixture = TestFixture::new();
    let (alice, sender) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = sender
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();
    sender.send_message(cap, b"sealed away").await.unwrap();

    let (_, denied_client) = fixture.client_with_policy(1, RefuseAll);
    let err = denied_client.fetch_messages(cap, None).await.unwrap_err();
    match err {
        ClientError::PolicyDenied(reason) => assert_eq!(reason, "approval contract refused"),
        other => panic!("expected PolicyDenied, got {other:?}"),
    }

    // Sending is not policy-gated; only decryption is.
    denied_client.send_message(cap, b"still fine").await.unwrap();
}
