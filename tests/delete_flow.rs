//! Integration tests for confirm-then-commit feed deletion through the
//! controller: workflow, in-flight tracking, cache invalidation, session
//! recovery and the projected sidebar.

use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use suprss::api::mock::{MockReply, MockTransport};
use suprss::api::{paths, Collection, Feed};
use suprss::cache::CacheKey;
use suprss::confirm::{ConfirmState, RequestOutcome};
use suprss::mutation::{MutationError, DELETE_FAILED_FALLBACK};
use suprss::navigation::RecordingNavigator;
use suprss::notify::{RecordingSink, Severity};
use suprss::{ControllerOptions, FeedController};

struct Fixture {
    mock: MockTransport,
    sink: Arc<RecordingSink>,
    nav: Arc<RecordingNavigator>,
    controller: FeedController,
}

fn feed(id: i64, title: &str) -> Feed {
    Feed {
        id,
        title: title.to_string(),
        url: format!("https://example.com/{}/rss", id),
        active: true,
        unread_count: None,
    }
}

fn fixture(feeds: Vec<Feed>) -> Fixture {
    let mock = MockTransport::new();
    mock.reply_json(Method::GET, paths::FEEDS, &feeds);
    mock.reply_json(Method::GET, paths::COLLECTIONS, &Vec::<Collection>::new());
    mock.reply_json(Method::GET, paths::ARTICLES, &Vec::<serde_json::Value>::new());
    for f in &feeds {
        mock.reply(Method::DELETE, &paths::feed(f.id), MockReply::NoContent);
    }

    let sink = Arc::new(RecordingSink::new());
    let nav = Arc::new(RecordingNavigator::new("/"));
    let controller = FeedController::new(
        Arc::new(mock.clone()),
        sink.clone(),
        nav.clone(),
        ControllerOptions::default(),
    );
    Fixture {
        mock,
        sink,
        nav,
        controller,
    }
}

/// Let spawned fetch and delete tasks run.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

async fn loaded(feeds: Vec<Feed>) -> Fixture {
    let fx = fixture(feeds);
    fx.controller.cache().prefetch();
    settle().await;
    fx
}

// ============================================================================
// Happy Path
// ============================================================================

#[tokio::test]
async fn test_delete_end_to_end_removes_row() {
    let fx = loaded(vec![feed(1, "A")]).await;
    assert_eq!(fx.controller.sidebar("/").feeds.len(), 1);

    fx.controller.request_delete(feed(1, "A"));
    fx.mock.reply_json(Method::GET, paths::FEEDS, &Vec::<Feed>::new());
    let task = fx.controller.confirm().expect("delete dispatched");
    task.await.unwrap().unwrap();
    settle().await;

    let view = fx.controller.sidebar("/");
    assert!(view.feeds.is_empty());
    assert!(view.confirm.is_none());
}

#[tokio::test]
async fn test_successful_delete_is_transiently_in_flight() {
    let fx = loaded(vec![feed(1, "A")]).await;
    fx.mock.hold(Method::DELETE, "/api/feeds/1");

    fx.controller.request_delete(feed(1, "A"));
    let task = fx.controller.confirm().unwrap();
    assert!(fx.controller.busy_set().contains(&1));
    assert!(fx.controller.sidebar("/").feeds[0].is_deleting);

    fx.mock.release(Method::DELETE, "/api/feeds/1");
    task.await.unwrap().unwrap();
    settle().await;

    assert!(fx.controller.busy_set().is_empty());
    assert_eq!(fx.controller.cache().fetch_count(CacheKey::Feeds), 2);
    assert_eq!(fx.controller.cache().fetch_count(CacheKey::Articles), 2);
    assert_eq!(fx.controller.cache().fetch_count(CacheKey::Collections), 1);
    assert!(fx.controller.pending_target().is_none());

    let notes = fx.sink.all();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Feed deleted");
    assert_eq!(notes[0].description, "RSS feed has been successfully deleted.");
    assert_eq!(notes[0].severity, Severity::Info);
}

#[tokio::test]
async fn test_invalidation_waits_for_server_confirmation() {
    let fx = loaded(vec![feed(1, "A")]).await;
    fx.mock.hold(Method::DELETE, "/api/feeds/1");

    fx.controller.request_delete(feed(1, "A"));
    let task = fx.controller.confirm().unwrap();
    settle().await;
    assert_eq!(fx.controller.cache().fetch_count(CacheKey::Feeds), 1);
    assert_eq!(fx.controller.sidebar("/").feeds.len(), 1);

    fx.mock.release(Method::DELETE, "/api/feeds/1");
    task.await.unwrap().unwrap();
    settle().await;
    assert_eq!(fx.controller.cache().fetch_count(CacheKey::Feeds), 2);
}

// ============================================================================
// Cancel
// ============================================================================

#[tokio::test]
async fn test_cancel_leaves_cache_untouched() {
    let fx = loaded(vec![feed(1, "A"), feed(2, "B")]).await;
    let before = fx.controller.feeds().items.clone();

    fx.controller.request_delete(feed(2, "B"));
    assert_eq!(fx.controller.confirm_state(), ConfirmState::AwaitingConfirmation);
    assert!(fx.controller.cancel());
    settle().await;

    assert_eq!(fx.controller.confirm_state(), ConfirmState::Idle);
    assert_eq!(fx.controller.feeds().items, before);
    assert_eq!(fx.controller.cache().fetch_count(CacheKey::Feeds), 1);
    assert_eq!(fx.mock.call_count(&Method::DELETE, "/api/feeds/2"), 0);
    assert!(fx.sink.is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unauthorized_delete_redirects_after_delay() {
    let fx = loaded(vec![feed(1, "A")]).await;
    fx.mock.reply(
        Method::DELETE,
        "/api/feeds/1",
        MockReply::Status {
            status: 401,
            message: Some("Unauthorized".to_string()),
        },
    );

    fx.controller.request_delete(feed(1, "A"));
    let result = fx.controller.confirm().unwrap().await.unwrap();
    assert!(matches!(result, Err(MutationError::SessionExpired(_))));

    let notes = fx.sink.all();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Unauthorized");
    assert_eq!(notes[0].description, "You are logged out. Logging in again...");
    assert_eq!(notes[0].severity, Severity::Destructive);

    tokio::time::sleep(Duration::from_millis(499)).await;
    assert!(fx.nav.redirects().is_empty());
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(fx.nav.redirects(), vec!["/api/login".to_string()]);

    assert_eq!(fx.controller.cache().fetch_count(CacheKey::Feeds), 1);
    assert_eq!(fx.controller.cache().fetch_count(CacheKey::Articles), 1);
}

#[tokio::test]
async fn test_server_error_keeps_target_for_retry() {
    let fx = loaded(vec![feed(1, "A")]).await;
    fx.mock.reply(
        Method::DELETE,
        "/api/feeds/1",
        MockReply::Status {
            status: 500,
            message: None,
        },
    );

    fx.controller.request_delete(feed(1, "A"));
    fx.controller.confirm().unwrap().await.unwrap().unwrap_err();
    settle().await;

    let notes = fx.sink.all();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Error");
    assert_eq!(notes[0].description, DELETE_FAILED_FALLBACK);
    assert_eq!(fx.controller.pending_target().map(|f| f.id), Some(1));
    assert_eq!(fx.controller.cache().fetch_count(CacheKey::Feeds), 1);
    assert!(fx.nav.redirects().is_empty());

    // Confirming again retries the same feed.
    fx.mock.reply(Method::DELETE, "/api/feeds/1", MockReply::NoContent);
    fx.controller.confirm().unwrap().await.unwrap().unwrap();
    assert!(fx.controller.pending_target().is_none());
    assert_eq!(fx.mock.call_count(&Method::DELETE, "/api/feeds/1"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_success_after_401_cancels_pending_redirect() {
    let fx = loaded(vec![feed(1, "A"), feed(2, "B")]).await;
    fx.mock.reply(
        Method::DELETE,
        "/api/feeds/1",
        MockReply::Status {
            status: 401,
            message: None,
        },
    );

    fx.controller.request_delete(feed(1, "A"));
    fx.controller.confirm().unwrap().await.unwrap().unwrap_err();
    fx.controller.cancel();

    fx.controller.request_delete(feed(2, "B"));
    fx.controller.confirm().unwrap().await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(fx.nav.redirects().is_empty());
}

// ============================================================================
// Duplicate Rejection
// ============================================================================

#[tokio::test]
async fn test_second_delete_while_first_in_flight_is_rejected() {
    let fx = loaded(vec![feed(1, "A")]).await;
    fx.mock.hold(Method::DELETE, "/api/feeds/1");

    fx.controller.request_delete(feed(1, "A"));
    let first = fx.controller.confirm().unwrap();

    assert!(fx.controller.confirm().is_none());
    assert_eq!(
        fx.controller.request_delete(feed(1, "A")),
        RequestOutcome::Busy { deleting: 1 }
    );
    assert!(fx.controller.confirm().is_none());
    assert_eq!(fx.mock.call_count(&Method::DELETE, "/api/feeds/1"), 0);

    fx.mock.release(Method::DELETE, "/api/feeds/1");
    first.await.unwrap().unwrap();
    assert_eq!(fx.mock.call_count(&Method::DELETE, "/api/feeds/1"), 1);
}

#[tokio::test]
async fn test_re_request_during_delete_keeps_target_for_retry() {
    let fx = loaded(vec![feed(1, "A")]).await;
    fx.mock.reply(
        Method::DELETE,
        "/api/feeds/1",
        MockReply::Status {
            status: 500,
            message: None,
        },
    );
    fx.mock.hold(Method::DELETE, "/api/feeds/1");

    fx.controller.request_delete(feed(1, "A"));
    let task = fx.controller.confirm().unwrap();
    fx.controller.request_delete(feed(1, "A"));
    assert!(!fx.controller.cancel());

    fx.mock.release(Method::DELETE, "/api/feeds/1");
    task.await.unwrap().unwrap_err();

    assert_eq!(fx.controller.pending_target().map(|f| f.id), Some(1));
    assert_eq!(fx.controller.confirm_state(), ConfirmState::AwaitingConfirmation);
}

// ============================================================================
// Cache Coalescing
// ============================================================================

#[tokio::test]
async fn test_double_invalidate_yields_one_refetch() {
    let fx = loaded(vec![feed(1, "A")]).await;
    fx.controller.cache().invalidate(CacheKey::Feeds);
    fx.controller.cache().invalidate(CacheKey::Feeds);
    settle().await;
    assert_eq!(fx.mock.call_count(&Method::GET, paths::FEEDS), 2);
}
