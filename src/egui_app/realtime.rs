//! Change Subscription
//!
//! Listens to the store's server-sent change feed and forwards a
//! [`ChangeEvent`] for every insert, update or delete on the subscribed
//! table. Receivers treat an event as "something changed" and re-fetch.
//!
//! There is no reconnect: when the stream fails the status goes to
//! `Error` and stays there until the subscription is replaced.

use std::sync::mpsc::{self, Receiver, Sender};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::sync::oneshot;

use crate::egui_app::context::StoreContext;
use crate::egui_app::store_client::check;
use crate::shared::error::StoreError;
use crate::shared::event::ChangeEvent;

/// Subscription status reported by a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Connecting,
    Connected,
    Error(String),
    Disconnected,
}

/// Source of change notifications for a table.
pub trait ChangeFeed: Send + Sync {
    /// Start delivering events for `table` to `notify` until the returned
    /// guard is dropped or unsubscribed.
    fn subscribe(&self, table: &str, notify: Sender<ChangeEvent>) -> Subscription;
}

/// Guard for a live subscription; tears the channel down on drop.
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
    status: Option<Receiver<SubscriptionStatus>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
            status: None,
        }
    }

    pub fn with_status(mut self, status: Receiver<SubscriptionStatus>) -> Self {
        self.status = Some(status);
        self
    }

    /// Latest status reported since the last poll (non-blocking)
    pub fn poll_status(&self) -> Option<SubscriptionStatus> {
        self.status.as_ref().and_then(|rx| rx.try_iter().last())
    }

    pub fn unsubscribe(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

/// Incremental decoder for a server-sent events byte stream.
///
/// Consecutive `data:` lines form one event; their values are joined with
/// `\n` and yielded when the blank line closing the event arrives. Bare
/// JSON object lines outside an event are yielded as they are, since some
/// proxies strip the SSE framing.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the payloads of all events completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();

        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    payloads.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            if let Some(value) = line.strip_prefix("data:") {
                let value = value.strip_prefix(' ').unwrap_or(value);
                self.data.push(value.to_string());
            } else if self.data.is_empty() && line.starts_with('{') && line.ends_with('}') {
                payloads.push(line.to_string());
            }
        }
        payloads
    }
}

/// `ChangeFeed` over the store's SSE endpoint
pub struct SseChangeFeed {
    ctx: StoreContext,
}

impl SseChangeFeed {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }
}

/// Everything the stream task needs, detached from the context.
struct FeedRequest {
    http: Client,
    url: String,
    key: String,
    token: Option<String>,
    table: String,
}

impl ChangeFeed for SseChangeFeed {
    fn subscribe(&self, table: &str, notify: Sender<ChangeEvent>) -> Subscription {
        let (status_tx, status_rx) = mpsc::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let request = FeedRequest {
            http: self.ctx.http().clone(),
            url: self.ctx.config().realtime_url(),
            key: self.ctx.config().store_key().to_string(),
            token: self.ctx.access_token(),
            table: table.to_string(),
        };

        self.ctx.spawn(async move {
            let _ = status_tx.send(SubscriptionStatus::Connecting);
            tokio::select! {
                _ = cancel_rx => {
                    tracing::debug!("Change feed for {} unsubscribed", request.table);
                    let _ = status_tx.send(SubscriptionStatus::Disconnected);
                }
                result = stream_changes(&request, &notify, &status_tx) => match result {
                    Ok(()) => {
                        tracing::info!("Change feed for {} closed", request.table);
                        let _ = status_tx.send(SubscriptionStatus::Disconnected);
                    }
                    Err(e) => {
                        tracing::warn!("Change feed for {} failed: {}", request.table, e);
                        let _ = status_tx.send(SubscriptionStatus::Error(e.to_string()));
                    }
                },
            }
        });

        Subscription::new(move || {
            let _ = cancel_tx.send(());
        })
        .with_status(status_rx)
    }
}

async fn stream_changes(
    request: &FeedRequest,
    notify: &Sender<ChangeEvent>,
    status: &Sender<SubscriptionStatus>,
) -> Result<(), StoreError> {
    let token = request.token.as_deref().ok_or(StoreError::NotAuthenticated)?;
    tracing::info!("Subscribing to change feed: {} table={}", request.url, request.table);

    let response = request
        .http
        .get(&request.url)
        .query(&[("table", request.table.as_str())])
        .header("apikey", &request.key)
        .header("Accept", "text/event-stream")
        .bearer_auth(token)
        .send()
        .await?;
    let response = check(response).await?;
    let _ = status.send(SubscriptionStatus::Connected);

    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for data in decoder.push(&chunk) {
            match ChangeEvent::parse(&data) {
                Ok(event) if event.affects(&request.table) => {
                    tracing::debug!("Change on {}: {:?}", event.table, event.operation);
                    if notify.send(event).is_err() {
                        // Receiver gone: the subscriber no longer exists.
                        return Ok(());
                    }
                }
                Ok(event) => tracing::trace!("Ignoring change on {}", event.table),
                Err(e) => tracing::warn!("Failed to parse change event: {} | {}", e, data),
            }
        }
    }
    Ok(())
}
