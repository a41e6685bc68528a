//! Store Context
//!
//! One explicitly constructed handle bundle passed to every component that
//! talks to the store: configuration, the pooled HTTP client, the tokio
//! runtime remote work runs on, and the access token of the current session.
//! Created once in `main`, shut down after the window closes.
//!
//! Tasks spawned onto the runtime must not own a `StoreContext`: the last
//! clone dropping inside the runtime would drop the runtime from within
//! itself.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::egui_app::config::Config;

#[derive(Clone)]
pub struct StoreContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    config: Config,
    http: Client,
    runtime: Runtime,
    access_token: RwLock<Option<String>>,
}

impl StoreContext {
    pub fn new(config: Config) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("smartmarks-io")
            .enable_all()
            .build()?;
        Ok(Self {
            inner: Arc::new(ContextInner {
                config,
                http: Client::new(),
                runtime,
                access_token: RwLock::new(None),
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Run `future` to completion on the context runtime. Must be called
    /// from a plain thread, never from inside an async task.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.inner.runtime.block_on(future)
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.inner.runtime.spawn(future)
    }

    /// Access token of the current session, if any.
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .access_token
            .read()
            .ok()
            .and_then(|token| token.clone())
    }

    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.inner.access_token.write() {
            *slot = token;
        }
    }

    /// Stop the runtime, giving in-flight work a moment to finish. If other
    /// clones are still alive the runtime stops when the last one drops.
    pub fn shutdown(self) {
        match Arc::try_unwrap(self.inner) {
            Ok(inner) => {
                inner.runtime.shutdown_timeout(Duration::from_secs(1));
                tracing::info!("Store context shut down");
            }
            Err(_) => {
                tracing::debug!("Store context still shared; runtime stops with the last handle");
            }
        }
    }
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("store_url", &self.config().store_url())
            .field("authenticated", &self.access_token().is_some())
            .finish()
    }
}
