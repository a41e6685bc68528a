//! Auth gateway tests
//!
//! Token exchange, refresh, sign-out and session restore against a mock
//! gateway.

use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use serde_json::json;
use smartmarks::egui_app::auth::{
    exchange_code, refresh_session, sign_out, AuthEvent, SessionFile, SessionStore,
};
use smartmarks::egui_app::context::StoreContext;
use smartmarks::shared::error::AuthError;
use smartmarks::shared::identity::{AuthSession, Identity};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{identity, off_runtime, test_config, TEST_KEY};

fn token_body(user: &Identity, access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": refresh,
        "user": { "id": user.id, "email": user.email, "aud": "authenticated" }
    })
}

#[tokio::test]
async fn test_exchange_code_sends_verifier() {
    let server = MockServer::start().await;
    let user = identity("a@x.com");

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "pkce"))
        .and(header("apikey", TEST_KEY))
        .and(body_json(json!({ "auth_code": "code-1", "code_verifier": "verifier-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(&user, "acc", "ref")))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let session = exchange_code(
        &reqwest::Client::new(),
        &config,
        "code-1".to_string(),
        "verifier-1".to_string(),
    )
    .await
    .unwrap();

    assert_eq!(session.user, user);
    assert_eq!(session.access_token, "acc");
    assert_eq!(session.refresh_token, "ref");
    let now = chrono::Utc::now().timestamp();
    crate::assert_in_range!(session.expires_at - now, 3590, 3600);
}

#[tokio::test]
async fn test_refresh_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let result = refresh_session(&reqwest::Client::new(), &config, "stale".to_string()).await;
    assert_matches!(result, Err(AuthError::Http { status: 400, .. }));
}

#[tokio::test]
async fn test_token_response_without_user_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "acc", "expires_in": 3600 })),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let result = refresh_session(&reqwest::Client::new(), &config, "r".to_string()).await;
    assert_matches!(result, Err(AuthError::Shape(_)));
}

#[tokio::test]
async fn test_sign_out_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    sign_out(&reqwest::Client::new(), &config, "acc").await.unwrap();
}

/// Poll `store` until `done` holds or two seconds pass.
fn poll_until(store: &mut SessionStore, done: impl Fn(&SessionStore) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        store.poll();
        if done(store) {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("session store did not settle");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restore_from_session_file() {
    let server = MockServer::start().await;
    let user = identity("a@x.com");
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "saved" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(&user, "acc", "next")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    SessionFile::new(&session_path)
        .save(&AuthSession {
            access_token: "old".into(),
            refresh_token: "saved".into(),
            issued_at: 0,
            expires_at: 0,
            user: user.clone(),
        })
        .unwrap();

    let uri = server.uri();
    let path_for_store = session_path.clone();
    let (restored, token, event) = off_runtime(move || {
        let ctx = StoreContext::new(test_config(&uri).with_session_path(path_for_store)).unwrap();
        let mut store = SessionStore::new(ctx.clone());
        let listener = store.listen();

        store.restore();
        assert!(store.is_restoring());
        poll_until(&mut store, |s| !s.is_restoring());

        let event = listener.try_next().map(|change| change.event);
        (store.identity().cloned(), ctx.access_token(), event)
    })
    .await;

    assert_eq!(restored, Some(user));
    assert_eq!(token.as_deref(), Some("acc"));
    assert_eq!(event, Some(AuthEvent::Restored));

    // The rotated refresh token replaces the saved one.
    let stored = SessionFile::new(&session_path).load().unwrap().unwrap();
    assert_eq!(stored.refresh_token, "next");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_short_lived_token_does_not_refresh_every_frame() {
    let server = MockServer::start().await;
    let user = identity("a@x.com");
    let mut body = token_body(&user, "acc", "next");
    body["expires_in"] = json!(30);
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    SessionFile::new(&session_path)
        .save(&AuthSession {
            access_token: "old".into(),
            refresh_token: "saved".into(),
            issued_at: 0,
            expires_at: 0,
            user: user.clone(),
        })
        .unwrap();

    let uri = server.uri();
    let restored = off_runtime(move || {
        let ctx = StoreContext::new(test_config(&uri).with_session_path(session_path)).unwrap();
        let mut store = SessionStore::new(ctx);
        store.restore();
        poll_until(&mut store, |s| !s.is_restoring());

        // Two seconds of frames.
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            store.poll();
            std::thread::sleep(Duration::from_millis(16));
        }
        store.identity().cloned()
    })
    .await;

    assert_eq!(restored, Some(user));
    let requests = server.received_requests().await.unwrap();
    let token_requests = requests
        .iter()
        .filter(|request| request.url.path() == "/auth/v1/token")
        .count();
    assert!(token_requests <= 2, "{token_requests} token requests in two seconds");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_restore_clears_session_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    SessionFile::new(&session_path)
        .save(&AuthSession {
            access_token: "old".into(),
            refresh_token: "revoked".into(),
            issued_at: 0,
            expires_at: 0,
            user: identity("a@x.com"),
        })
        .unwrap();

    let uri = server.uri();
    let path_for_store = session_path.clone();
    let identity = off_runtime(move || {
        let ctx = StoreContext::new(test_config(&uri).with_session_path(path_for_store)).unwrap();
        let mut store = SessionStore::new(ctx);
        store.restore();
        poll_until(&mut store, |s| !s.is_restoring());
        store.identity().cloned()
    })
    .await;

    assert_eq!(identity, None);
    assert!(!session_path.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_publishes_and_revokes() {
    let server = MockServer::start().await;
    let user = identity("a@x.com");
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(&user, "acc", "next")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    SessionFile::new(&session_path)
        .save(&AuthSession {
            access_token: "old".into(),
            refresh_token: "saved".into(),
            issued_at: 0,
            expires_at: 0,
            user: user.clone(),
        })
        .unwrap();

    let uri = server.uri();
    let path_for_store = session_path.clone();
    let (last_event, token) = off_runtime(move || {
        let ctx = StoreContext::new(test_config(&uri).with_session_path(path_for_store)).unwrap();
        let mut store = SessionStore::new(ctx.clone());
        store.restore();
        poll_until(&mut store, |s| s.identity().is_some());

        let listener = store.listen();
        let _ = listener.try_next();
        store.logout();
        let last = listener.try_next();
        // Give the revoke request time to reach the server.
        std::thread::sleep(Duration::from_millis(300));
        (last, ctx.access_token())
    })
    .await;

    let change = last_event.unwrap();
    assert_eq!(change.event, AuthEvent::SignedOut);
    assert_eq!(change.identity, None);
    assert_eq!(token, None);
    assert!(!session_path.exists());
}

#[test]
fn test_no_session_file_means_login() {
    let ctx = StoreContext::new(test_config("http://127.0.0.1:9")).unwrap();
    let mut store = SessionStore::new(ctx.clone());
    store.restore();
    assert!(!store.is_restoring());
    assert_eq!(store.identity(), None);
    drop(store);
    ctx.shutdown();
}

#[test]
fn test_listen_seeds_nothing_without_session() {
    let ctx = StoreContext::new(test_config("http://127.0.0.1:9")).unwrap();
    let store = SessionStore::new(ctx);
    let listener = store.listen();
    assert!(listener.try_next().is_none());
    assert_eq!(store.events().listener_count(), 1);
}
