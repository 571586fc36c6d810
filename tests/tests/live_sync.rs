//! The live view driven end-to-end: subscription lifecycle, the fixed retry
//! policy, terminal failure with manual reset, and drop-cancellation. The
//! paused clock drives the 2-second retry delay.

use std::sync::Arc;

use denki_api::{Error, PostId, Uuid};
use denki_client::{submit_comment, LiveComments, SyncState, RETRY_DELAY};
use denki_mock_store::MockStore;
use tests::{comment, session, wait_for};

fn init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn post_id(n: u128) -> PostId {
    PostId(Uuid::from_u128(n))
}

#[tokio::test(start_paused = true)]
async fn first_snapshot_brings_the_view_to_synced() {
    init();
    let store = Arc::new(MockStore::new());
    store.insert_raw_comment(comment(1, post_id(1), None, 5));

    let live = LiveComments::spawn(store.clone(), post_id(1));
    let mut view = live.view();
    let synced = wait_for(&mut view, |v| v.state == SyncState::Synced).await;
    assert_eq!(synced.threads.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn every_store_change_rebuilds_the_forest() {
    init();
    let store = Arc::new(MockStore::new());
    let live = LiveComments::spawn(store.clone(), post_id(1));
    let mut view = live.view();
    wait_for(&mut view, |v| v.state == SyncState::Synced).await;

    let u1 = session(1, "u1");
    submit_comment(&*store, Some(&u1), post_id(1), "first!")
        .await
        .unwrap();
    let v = wait_for(&mut view, |v| v.threads.len() == 1).await;
    assert_eq!(v.threads[0].root.content, "first!");

    // a reply observed through the feed lands under its parent
    let parent = v.threads[0].root.id;
    store.insert_raw_comment(comment(7, post_id(1), Some(parent), 50));
    let v = wait_for(&mut view, |v| {
        v.threads.first().map(|t| t.replies.len()) == Some(1)
    })
    .await;
    assert_eq!(v.threads.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn live_view_survives_a_missing_index() {
    init();
    let store = Arc::new(MockStore::without_comment_index());
    for (n, secs) in [(1, 10), (2, 30), (3, 20)] {
        store.insert_raw_comment(comment(n, post_id(1), None, secs));
    }

    let live = LiveComments::spawn(store.clone(), post_id(1));
    let mut view = live.view();
    let synced = wait_for(&mut view, |v| v.state == SyncState::Synced).await;
    // the unordered fallback feed still renders newest-first
    let times: Vec<i64> = synced
        .threads
        .iter()
        .map(|t| t.root.created_at.timestamp())
        .collect();
    assert_eq!(times, vec![30, 20, 10]);
}

#[tokio::test(start_paused = true)]
async fn three_consecutive_errors_end_in_terminal_failed() {
    init();
    let store = Arc::new(MockStore::new());
    store.insert_raw_comment(comment(1, post_id(1), None, 5));
    for _ in 0..3 {
        store.test_fail_next(Error::Transient(String::from("backend unavailable")));
    }

    let live = LiveComments::spawn(store.clone(), post_id(1));
    let mut view = live.view();
    let failed = wait_for(&mut view, |v| matches!(v.state, SyncState::Failed(_))).await;
    assert!(matches!(failed.state, SyncState::Failed(Error::Transient(_))));

    // no fourth automatic attempt: a newly scripted failure stays unconsumed
    store.test_fail_next(Error::Transient(String::from("still down")));
    tokio::time::sleep(RETRY_DELAY * 5).await;
    assert_eq!(store.test_pending_failures(), 1);
    assert!(matches!(view.borrow().state, SyncState::Failed(_)));

    // the manual retry resets the counter: the queued failure only burns
    // attempt one, and the attempt after it connects
    live.retry();
    let retrying = wait_for(&mut view, |v| matches!(v.state, SyncState::Retrying { .. })).await;
    assert_eq!(retrying.state, SyncState::Retrying { attempt: 1 });
    let synced = wait_for(&mut view, |v| v.state == SyncState::Synced).await;
    assert_eq!(synced.threads.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn permission_denied_is_final_without_automatic_retry() {
    init();
    let store = Arc::new(MockStore::new());
    store.test_fail_next(Error::PermissionDenied);

    let live = LiveComments::spawn(store.clone(), post_id(1));
    let mut view = live.view();
    let failed = wait_for(&mut view, |v| matches!(v.state, SyncState::Failed(_))).await;
    assert_eq!(failed.state, SyncState::Failed(Error::PermissionDenied));

    store.test_fail_next(Error::PermissionDenied);
    tokio::time::sleep(RETRY_DELAY * 5).await;
    assert_eq!(store.test_pending_failures(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_feed_error_recovers_after_one_retry() {
    init();
    let store = Arc::new(MockStore::new());
    store.insert_raw_comment(comment(1, post_id(1), None, 5));

    let live = LiveComments::spawn(store.clone(), post_id(1));
    let mut view = live.view();
    wait_for(&mut view, |v| v.state == SyncState::Synced).await;

    store.test_emit_feed_error(post_id(1), Error::Transient(String::from("watch dropped")));
    let retrying = wait_for(&mut view, |v| matches!(v.state, SyncState::Retrying { .. })).await;
    assert_eq!(retrying.state, SyncState::Retrying { attempt: 1 });
    // the forest from before the disconnection stays visible while retrying
    assert_eq!(retrying.threads.len(), 1);

    let synced = wait_for(&mut view, |v| v.state == SyncState::Synced).await;
    assert_eq!(synced.threads.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn a_closed_feed_counts_as_transient_and_resubscribes() {
    init();
    let store = Arc::new(MockStore::new());
    let live = LiveComments::spawn(store.clone(), post_id(1));
    let mut view = live.view();
    wait_for(&mut view, |v| v.state == SyncState::Synced).await;

    store.test_close_feeds(post_id(1));
    wait_for(&mut view, |v| matches!(v.state, SyncState::Retrying { .. })).await;
    wait_for(&mut view, |v| v.state == SyncState::Synced).await;
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_cancels_the_in_flight_retry_timer() {
    init();
    let store = Arc::new(MockStore::new());
    store.test_fail_next(Error::Transient(String::from("flaky")));

    let live = LiveComments::spawn(store.clone(), post_id(1));
    let mut view = live.view();
    wait_for(&mut view, |v| matches!(v.state, SyncState::Retrying { .. })).await;

    drop(live);
    // the task exits without waiting out the delay
    assert!(view.changed().await.is_err());
    assert_eq!(store.test_pending_failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_unsubscribes() {
    init();
    let store = Arc::new(MockStore::new());
    let live = LiveComments::spawn(store.clone(), post_id(1));
    let mut view = live.view();
    wait_for(&mut view, |v| v.state == SyncState::Synced).await;
    assert_eq!(store.test_feed_count(post_id(1)), 1);

    drop(live);
    assert!(view.changed().await.is_err());
    // the store prunes the dead feed on its next delivery
    store.insert_raw_comment(comment(1, post_id(1), None, 5));
    assert_eq!(store.test_feed_count(post_id(1)), 0);
}
