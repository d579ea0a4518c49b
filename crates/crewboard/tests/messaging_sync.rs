//! Polling subscriptions and message sending.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use crewboard::domain::{ConversationId, UserId};
use crewboard::screens::{MessageComposer, SendOutcome, Session};
use crewboard::sync::SyncError;
use tokio::time::sleep;

fn seeded() -> Arc<MockApi> {
    let api = Arc::new(MockApi::with_page_size(50));
    api.with_backend(|backend| {
        let mut thread = conversation(1, 200);
        thread.unread_count = 2;
        backend.conversations = vec![thread, conversation(2, 300)];
        backend.messages = vec![
            message(1, 1, 200, "Can you start Monday?"),
            message(2, 1, 200, "Bring your own harness."),
        ];
        backend.unread = 2;
    });
    api
}

#[tokio::test(start_paused = true)]
async fn conversations_poll_every_fifteen_seconds() {
    let api = seeded();
    let sync = sync_with(api.clone());
    let mut inbox = sync.watch_conversations(Some(TOKEN));

    let first = inbox.settled().await.expect("initial load");
    assert_eq!(first.data.expect("inbox").results.len(), 2);
    assert_eq!(api.calls("conversations"), 1);

    sleep(Duration::from_millis(14_900)).await;
    assert_eq!(api.calls("conversations"), 1);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(api.calls("conversations"), 2);

    sleep(Duration::from_secs(15)).await;
    assert_eq!(api.calls("conversations"), 3);
}

#[tokio::test(start_paused = true)]
async fn open_thread_and_unread_badge_poll_independently() {
    let api = seeded();
    let sync = sync_with(api.clone());
    let mut thread = sync.watch_conversation_messages(Some(TOKEN), ConversationId(1), 1);
    let mut badge = sync.watch_unread_count(Some(TOKEN));
    thread.settled().await.expect("thread loads");
    badge.settled().await.expect("badge loads");

    sleep(Duration::from_millis(30_100)).await;
    assert_eq!(api.calls("conversation_messages"), 7);
    assert_eq!(api.calls("unread_count"), 2);
}

#[tokio::test(start_paused = true)]
async fn signed_out_subscriptions_stay_idle() {
    let api = seeded();
    let sync = sync_with(api.clone());
    let inbox = sync.watch_conversations(None);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(api.total_calls(), 0);
    assert!(inbox.current().data.is_none());
}

#[tokio::test(start_paused = true)]
async fn sending_refreshes_the_open_thread_immediately() {
    let api = seeded();
    let sync = sync_with(api.clone());
    let mut thread = sync.watch_conversation_messages(Some(TOKEN), ConversationId(1), 1);
    let loaded = thread.settled().await.expect("thread loads");
    assert_eq!(loaded.data.expect("messages").results.len(), 2);

    sync.send_message(Some(TOKEN), ConversationId(1), "  On my way  ")
        .await
        .expect("send succeeds");

    let refreshed = thread.changed().await.expect("thread refetched");
    let page = refreshed.data.expect("messages");
    assert_eq!(page.results.len(), 3);
    assert_eq!(page.results[2].content, "On my way");
    assert_eq!(api.calls("conversation_messages"), 2);
}

#[tokio::test]
async fn blank_messages_are_blocked_before_the_network() {
    let api = seeded();
    let sync = sync_with(api.clone());

    let result = sync
        .send_message(Some(TOKEN), ConversationId(1), " \n\t ")
        .await;
    assert_eq!(result, Err(SyncError::EmptyMessage));

    let composer = MessageComposer::new(
        sync.clone(),
        Session::signed_in(TOKEN, crewboard::domain::AccountKind::Individual),
        ConversationId(1),
    );
    composer.set_draft("   ");
    assert!(!composer.can_send());
    assert_eq!(composer.send().await, Ok(SendOutcome::Blocked));
    assert_eq!(api.calls("send_message"), 0);
}

#[tokio::test]
async fn composer_clears_draft_after_sending() {
    let api = seeded();
    let sync = sync_with(api.clone());
    let composer = MessageComposer::new(
        sync,
        Session::signed_in(TOKEN, crewboard::domain::AccountKind::Individual),
        ConversationId(2),
    );

    composer.set_draft("Quote attached");
    assert!(composer.can_send());
    let (first, second) = tokio::join!(composer.send(), composer.send());

    assert!(matches!(first, Ok(SendOutcome::Sent(_))));
    assert_eq!(second, Ok(SendOutcome::Blocked));
    assert_eq!(api.calls("send_message"), 1);
    assert!(composer.text().is_empty());
    assert!(!composer.is_sending());
}

#[tokio::test(start_paused = true)]
async fn abandoned_send_unlocks_the_composer() {
    let api = seeded();
    let composer = MessageComposer::new(
        sync_with(api.clone()),
        Session::signed_in(TOKEN, crewboard::domain::AccountKind::Individual),
        ConversationId(2),
    );
    composer.set_draft("On my way");
    api.stall("send_message");

    let abandoned = tokio::time::timeout(Duration::from_secs(5), composer.send()).await;
    assert!(abandoned.is_err());
    assert!(!composer.is_sending());
    assert!(composer.can_send());
    assert_eq!(composer.text(), "On my way");

    api.resume("send_message");
    let retried = composer.send().await;
    assert!(matches!(retried, Ok(SendOutcome::Sent(_))));
    assert!(composer.text().is_empty());
    assert_eq!(api.calls("send_message"), 2);
}

#[tokio::test]
async fn marking_read_refreshes_the_unread_badge() {
    let api = seeded();
    let sync = sync_with(api.clone());

    let before = sync.unread_count(Some(TOKEN)).await;
    assert_eq!(before.data.expect("count").unread_count, 2);

    sync.mark_conversation_read(Some(TOKEN), ConversationId(1))
        .await
        .expect("mark read succeeds");

    let after = sync.unread_count(Some(TOKEN)).await;
    assert_eq!(after.data.expect("count").unread_count, 0);
    assert_eq!(api.calls("unread_count"), 2);
}

#[tokio::test]
async fn opening_a_conversation_reuses_existing_threads() {
    let api = seeded();
    let sync = sync_with(api.clone());

    sync.conversations(Some(TOKEN)).await;
    let existing = sync
        .get_or_create_conversation(Some(TOKEN), UserId(200))
        .await
        .expect("conversation resolves");
    assert_eq!(existing.id, ConversationId(1));

    let created = sync
        .get_or_create_conversation(Some(TOKEN), UserId(400))
        .await
        .expect("conversation created");
    assert_eq!(created.id, ConversationId(3));

    let inbox = sync.conversations(Some(TOKEN)).await;
    assert_eq!(inbox.data.expect("inbox").results.len(), 3);
    assert_eq!(api.calls("conversations"), 2);
}
