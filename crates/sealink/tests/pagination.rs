//! Cursor pagination: chained pages partition the channel exactly.

use proptest::prelude::*;
use sealink::{Cursor, FetchedMessage};
use sealink_testkit::{generators, TestClient, TestFixture};

/// Drain the channel page by page, asserting cursor discipline throughout.
async fn drain(client: &TestClient, cap: &sealink::MemberCap) -> Vec<FetchedMessage> {
    let page_size = client.config().page_size;
    let mut all = Vec::new();
    let mut cursor: Option<Cursor> = None;

    loop {
        let page = client.fetch_messages(cap, cursor).await.unwrap();
        assert!(page.messages.len() <= page_size);
        if page.next_cursor.is_some() {
            // A continuation is only ever offered from a full page.
            assert_eq!(page.messages.len(), page_size);
        }
        all.extend(page.messages);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return all,
        }
    }
}

fn assert_exact_partition(messages: &[FetchedMessage], total: u64) {
    let seqs: Vec<u64> = messages.iter().map(|m| m.seq).collect();
    let expected: Vec<u64> = (1..=total).collect();
    // Union of pages is the full set, ascending, no duplicates, no gaps.
    assert_eq!(seqs, expected);

    // seq alone is the delivery order; created_at_ms never reorders pages.
    for pair in messages.windows(2) {
        assert!(pair[0].seq < pair[1].seq, "messages out of order");
    }
}

#[tokio::test]
async fn test_pages_partition_the_channel() {
    let fixture = TestFixture::with_page_size(10);
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();

    for i in 0..25 {
        fixture.clock.advance_ms(1_000);
        client
            .send_message(cap, format!("message {i}").as_bytes())
            .await
            .unwrap();
    }

    let first = client.fetch_messages(cap, None).await.unwrap();
    assert_eq!(first.messages.len(), 10);
    assert_eq!(first.next_cursor, Some(Cursor(10)));

    let all = drain(&client, cap).await;
    assert_exact_partition(&all, 25);
    assert_eq!(all[24].content.text(), Some("message 24"));
}

#[tokio::test]
async fn test_empty_channel_fetch() {
    let fixture = TestFixture::new();
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();

    let page = client.fetch_messages(cap, None).await.unwrap();
    assert!(page.messages.is_empty());
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_cursor_resumes_across_concurrent_sends() {
    let fixture = TestFixture::with_page_size(3);
    let (alice, client) = fixture.client(1);
    let bob = TestFixture::address(2);

    let created = client
        .create_channel(alice, &[bob.to_hex()])
        .await
        .unwrap();
    let cap = created.cap_for(&alice).unwrap();

    for i in 0..4 {
        fixture.clock.advance_ms(1_000);
        client
            .send_message(cap, format!("early {i}").as_bytes())
            .await
            .unwrap();
    }

    let page = client.fetch_messages(cap, None).await.unwrap();
    let cursor = page.next_cursor.unwrap();

    // New sends land between pages; the resumed cursor picks up everything
    // after the last seen seq with no skips or repeats.
    for i in 0..3 {
        fixture.clock.advance_ms(1_000);
        client
            .send_message(cap, format!("late {i}").as_bytes())
            .await
            .unwrap();
    }

    let mut seen: Vec<u64> = page.messages.iter().map(|m| m.seq).collect();
    let mut cursor = Some(cursor);
    while let Some(c) = cursor {
        let page = client.fetch_messages(cap, Some(c)).await.unwrap();
        seen.extend(page.messages.iter().map(|m| m.seq));
        cursor = page.next_cursor;
    }
    assert_eq!(seen, (1..=7).collect::<Vec<u64>>());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_any_page_size_partitions_exactly(
        page_size in generators::page_size(),
        total in 0u64..40,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fixture = TestFixture::with_page_size(page_size);
            let (alice, client) = fixture.client(1);
            let bob = TestFixture::address(2);

            let created = client
                .create_channel(alice, &[bob.to_hex()])
                .await
                .unwrap();
            let cap = created.cap_for(&alice).unwrap();

            for i in 0..total {
                fixture.clock.advance_ms(500);
                client
                    .send_message(cap, format!("m{i}").as_bytes())
                    .await
                    .unwrap();
            }

            let all = drain(&client, cap).await;
            assert_exact_partition(&all, total);
        });
    }
}
