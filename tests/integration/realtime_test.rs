//! Change feed tests
//!
//! The mock server answers the SSE request with a finished body, so each
//! test sees the events followed by the stream closing.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use smartmarks::egui_app::realtime::{ChangeFeed, SseChangeFeed, Subscription, SubscriptionStatus};
use smartmarks::shared::event::{ChangeEvent, ChangeOperation};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{off_runtime, signed_in_context, TEST_KEY};

const FEED: &str = concat!(
    ": connected\n\n",
    "event: change\n",
    "data: {\"type\":\"INSERT\",\"table\":\"bookmarks\",\"record\":{\"title\":\"Docs\"}}\n\n",
    "data: {\"type\":\"UPDATE\",\"table\":\"profiles\"}\n\n",
    "data: not json\n\n",
    "{\"eventType\":\"DELETE\",\"table\":\"bookmarks\",\"old_record\":{}}\n",
);

/// Last status reported once the subscription reaches a final one
fn final_status(subscription: &Subscription) -> Option<SubscriptionStatus> {
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut last = None;
    while Instant::now() < deadline {
        if let Some(status) = subscription.poll_status() {
            last = Some(status);
        }
        if matches!(
            last,
            Some(SubscriptionStatus::Disconnected) | Some(SubscriptionStatus::Error(_))
        ) {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    last
}

#[tokio::test(flavor = "multi_thread")]
async fn test_feed_forwards_table_changes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/realtime/v1/sse"))
        .and(query_param("table", "bookmarks"))
        .and(header("apikey", TEST_KEY))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FEED, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let (events, status) = off_runtime(move || {
        let feed = SseChangeFeed::new(signed_in_context(&uri));
        let (tx, rx) = mpsc::channel();
        let subscription = feed.subscribe("bookmarks", tx);
        let status = final_status(&subscription);
        let events: Vec<ChangeEvent> = rx.try_iter().collect();
        (events, status)
    })
    .await;

    assert_eq!(
        events,
        vec![
            ChangeEvent::new(ChangeOperation::Insert, "bookmarks"),
            ChangeEvent::new(ChangeOperation::Delete, "bookmarks"),
        ]
    );
    assert_eq!(status, Some(SubscriptionStatus::Disconnected));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_feed_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/realtime/v1/sse"))
        .respond_with(ResponseTemplate::new(401).set_body_string("jwt expired"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let status = off_runtime(move || {
        let feed = SseChangeFeed::new(signed_in_context(&uri));
        let (tx, _rx) = mpsc::channel();
        let subscription = feed.subscribe("bookmarks", tx);
        final_status(&subscription)
    })
    .await;

    match status {
        Some(SubscriptionStatus::Error(message)) => {
            crate::assert_contains!(message, "401");
        }
        other => panic!("expected error status, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsubscribe_stops_pending_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/realtime/v1/sse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FEED, "text/event-stream")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let (early, after_teardown) = off_runtime(move || {
        let feed = SseChangeFeed::new(signed_in_context(&uri));
        let (tx, rx) = mpsc::channel();
        let subscription = feed.subscribe("bookmarks", tx);
        std::thread::sleep(Duration::from_millis(100));
        let early = subscription.poll_status();

        subscription.unsubscribe();
        // The stream task drops its sender once it has stopped.
        (early, rx.recv_timeout(Duration::from_secs(2)))
    })
    .await;

    assert_eq!(early, Some(SubscriptionStatus::Connecting));
    assert_eq!(after_teardown, Err(mpsc::RecvTimeoutError::Disconnected));
}
