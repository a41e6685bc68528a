/**
 * Authentication Module
 *
 * Session store for the desktop client. Sign-in is a PKCE code flow: the
 * browser is sent to the provider's authorize page, the provider redirects
 * back to a loopback listener, and the code is exchanged for tokens. The
 * refresh token is persisted so the next launch can recover the session.
 *
 * Identity changes fan out through `SessionEvents`; each observer holds a
 * `SessionListener` guard and stops receiving as soon as it is dropped.
 */

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::egui_app::config::{Config, CALLBACK_PATH};
use crate::egui_app::context::StoreContext;
use crate::egui_app::types::{CallbackParams, PkceExchangeRequest, RefreshTokenRequest};
use crate::shared::error::AuthError;
use crate::shared::identity::{AuthSession, Identity, TokenResponse};

/// How long the loopback listener waits for the provider redirect
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);
/// Refresh the access token when it expires within this many seconds,
/// capped at half its lifetime
pub const REFRESH_MARGIN_SECS: i64 = 60;

const CALLBACK_PAGE: &str = "<!doctype html><html><body style=\"font-family:sans-serif\">\
<h2>Signed in</h2><p>You can close this tab and return to Smartmarks.</p></body></html>";

// ---------------------------------------------------------------------------
// Identity change fan-out
// ---------------------------------------------------------------------------

/// What caused an identity change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Current state handed to a listener when it registers
    Initial,
    /// Persisted session recovered at startup
    Restored,
    SignedIn,
    TokenRefreshed,
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityChange {
    pub event: AuthEvent,
    pub identity: Option<Identity>,
}

type ListenerList = Mutex<Vec<(u64, Sender<IdentityChange>)>>;

/// Registry of identity-change listeners
#[derive(Clone, Default)]
pub struct SessionEvents {
    listeners: Arc<ListenerList>,
    next_id: Arc<AtomicU64>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It receives every change published until it is
    /// dropped.
    pub fn listen(&self) -> SessionListener {
        self.listen_with(None)
    }

    /// Register a listener whose first message is `initial`.
    pub fn listen_with(&self, initial: Option<IdentityChange>) -> SessionListener {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel();
        if let Some(change) = initial {
            let _ = tx.send(change);
        }
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, tx));
        }
        SessionListener {
            id,
            listeners: Arc::downgrade(&self.listeners),
            rx,
        }
    }

    pub fn publish(&self, change: IdentityChange) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.retain(|(_, tx)| tx.send(change.clone()).is_ok());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// Receiving end of a listener registration; unregisters on drop.
pub struct SessionListener {
    id: u64,
    listeners: Weak<ListenerList>,
    rx: Receiver<IdentityChange>,
}

impl SessionListener {
    /// Next pending change, if any (non-blocking)
    pub fn try_next(&self) -> Option<IdentityChange> {
        self.rx.try_recv().ok()
    }
}

impl Drop for SessionListener {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Auth gateway requests
// ---------------------------------------------------------------------------

/// Fresh PKCE code verifier: 64 hex characters.
pub fn new_code_verifier() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Provider authorize URL for the configured provider and loopback callback.
/// The challenge method is `plain`, so the verifier doubles as challenge.
pub fn authorize_url(config: &Config, code_verifier: &str) -> Result<String, AuthError> {
    let url = Url::parse_with_params(
        &config.auth_url("/authorize"),
        &[
            ("provider", config.app().oauth_provider.as_str()),
            ("redirect_to", config.callback_url().as_str()),
            ("code_challenge", code_verifier),
            ("code_challenge_method", "plain"),
        ],
    )
    .map_err(|e| AuthError::callback(format!("invalid authorize URL: {}", e)))?;
    Ok(url.to_string())
}

async fn request_token<B: Serialize>(
    http: &Client,
    config: &Config,
    grant_type: &str,
    body: &B,
) -> Result<AuthSession, AuthError> {
    tracing::debug!("POST {} grant_type={}", config.auth_url("/token"), grant_type);
    let response = http
        .post(config.auth_url("/token"))
        .query(&[("grant_type", grant_type)])
        .header("apikey", config.store_key())
        .json(body)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| status.to_string());
        return Err(AuthError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    let token: TokenResponse = serde_json::from_str(&text)?;
    Ok(AuthSession::from_response(token, chrono::Utc::now().timestamp()))
}

/// Exchange an authorization code for a session
pub async fn exchange_code(
    http: &Client,
    config: &Config,
    auth_code: String,
    code_verifier: String,
) -> Result<AuthSession, AuthError> {
    let body = PkceExchangeRequest {
        auth_code,
        code_verifier,
    };
    request_token(http, config, "pkce", &body).await
}

/// Trade a refresh token for a new session
pub async fn refresh_session(
    http: &Client,
    config: &Config,
    refresh_token: String,
) -> Result<AuthSession, AuthError> {
    let body = RefreshTokenRequest { refresh_token };
    request_token(http, config, "refresh_token", &body).await
}

/// Revoke the session remotely
pub async fn sign_out(http: &Client, config: &Config, access_token: &str) -> Result<(), AuthError> {
    let response = http
        .post(config.auth_url("/logout"))
        .header("apikey", config.store_key())
        .bearer_auth(access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| status.to_string());
        return Err(AuthError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Loopback callback listener
// ---------------------------------------------------------------------------

/// Bind the loopback port and wait for the provider redirect.
pub async fn await_callback(
    port: u16,
    timeout: Duration,
    cancel: oneshot::Receiver<()>,
) -> Result<String, AuthError> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|e| AuthError::callback(format!("cannot listen on port {}: {}", port, e)))?;
    await_callback_on(listener, timeout, cancel).await
}

/// Serve the callback route on `listener` until one redirect arrives, the
/// timeout passes or `cancel` resolves (sent or dropped).
pub async fn await_callback_on(
    listener: TcpListener,
    timeout: Duration,
    cancel: oneshot::Receiver<()>,
) -> Result<String, AuthError> {
    let (params_tx, mut params_rx) = tokio::sync::mpsc::channel::<CallbackParams>(1);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let app = Router::new()
        .route(CALLBACK_PATH, get(handle_callback))
        .with_state(params_tx);

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    let outcome = tokio::select! {
        params = params_rx.recv() => match params {
            Some(params) => params.into_code().map_err(AuthError::Callback),
            None => Err(AuthError::callback("callback listener closed")),
        },
        _ = tokio::time::sleep(timeout) => {
            Err(AuthError::callback("timed out waiting for the identity provider"))
        }
        _ = cancel => Err(AuthError::callback("sign-in cancelled")),
    };

    let _ = stop_tx.send(());
    match tokio::time::timeout(Duration::from_secs(2), server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::debug!("Callback listener error: {}", e),
        Ok(Err(e)) => tracing::debug!("Callback listener task failed: {}", e),
        Err(_) => tracing::debug!("Callback listener did not stop in time"),
    }
    outcome
}

async fn handle_callback(
    State(tx): State<tokio::sync::mpsc::Sender<CallbackParams>>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    let _ = tx.try_send(params);
    Html(CALLBACK_PAGE)
}

// ---------------------------------------------------------------------------
// Session persistence
// ---------------------------------------------------------------------------

/// What survives a restart: enough to ask for a new access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub refresh_token: String,
    pub user: Identity,
}

/// JSON file holding the last session's refresh token
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no session was saved.
    pub fn load(&self) -> Result<Option<StoredSession>, AuthError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, session: &AuthSession) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            refresh_token: session.refresh_token.clone(),
            user: session.user.clone(),
        };
        std::fs::write(&self.path, serde_json::to_vec_pretty(&stored)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Session store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthTask {
    Restore,
    Login,
    Refresh,
}

struct PendingAuth {
    task: AuthTask,
    result: Receiver<Result<AuthSession, AuthError>>,
    /// Dropping this stops the loopback listener of a pending sign-in
    _cancel: Option<oneshot::Sender<()>>,
    authorize_url: Option<String>,
}

/// Holds the current session and drives sign-in, refresh and sign-out.
pub struct SessionStore {
    ctx: StoreContext,
    session: Option<AuthSession>,
    events: SessionEvents,
    file: Option<SessionFile>,
    pending: Option<PendingAuth>,
}

impl SessionStore {
    pub fn new(ctx: StoreContext) -> Self {
        let file = ctx.config().session_path().map(SessionFile::new);
        Self {
            ctx,
            session: None,
            events: SessionEvents::new(),
            file,
            pending: None,
        }
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Register a listener, seeded with the current identity if one exists.
    pub fn listen(&self) -> SessionListener {
        let initial = self.session.as_ref().map(|session| IdentityChange {
            event: AuthEvent::Initial,
            identity: Some(session.user.clone()),
        });
        self.events.listen_with(initial)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    pub fn is_restoring(&self) -> bool {
        matches!(&self.pending, Some(p) if p.task == AuthTask::Restore)
    }

    pub fn is_signing_in(&self) -> bool {
        matches!(&self.pending, Some(p) if p.task == AuthTask::Login)
    }

    /// Try to recover the previous session from the session file.
    pub fn restore(&mut self) {
        let Some(file) = &self.file else {
            return;
        };
        match file.load() {
            Ok(Some(stored)) => {
                tracing::info!("Restoring session for {}", stored.user.email);
                self.spawn_refresh(AuthTask::Restore, stored.refresh_token);
            }
            Ok(None) => tracing::debug!("No saved session at {}", file.path().display()),
            Err(e) => {
                tracing::warn!("Discarding unreadable session file: {}", e);
                if let Err(e) = file.clear() {
                    tracing::warn!("Failed to remove session file: {}", e);
                }
            }
        }
    }

    /// Start a sign-in. Returns the URL to open in the browser; the identity
    /// arrives later through `poll`.
    pub fn login(&mut self) -> Result<String, AuthError> {
        if let Some(PendingAuth {
            task: AuthTask::Login,
            authorize_url: Some(url),
            ..
        }) = &self.pending
        {
            return Ok(url.clone());
        }

        let verifier = new_code_verifier();
        let url = authorize_url(self.ctx.config(), &verifier)?;
        let port = self.ctx.config().app().callback_port;

        let (tx, rx) = mpsc::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let ctx = self.ctx.clone();
        std::thread::spawn(move || {
            let result = ctx.block_on(async {
                let code = await_callback(port, LOGIN_TIMEOUT, cancel_rx).await?;
                exchange_code(ctx.http(), ctx.config(), code, verifier).await
            });
            let _ = tx.send(result);
        });

        tracing::info!("Sign-in started, waiting for redirect on port {}", port);
        self.pending = Some(PendingAuth {
            task: AuthTask::Login,
            result: rx,
            _cancel: Some(cancel_tx),
            authorize_url: Some(url.clone()),
        });
        Ok(url)
    }

    /// Drop the session locally, notify listeners, then revoke remotely.
    pub fn logout(&mut self) {
        self.pending = None;
        let previous = self.session.take();
        self.ctx.set_access_token(None);
        self.clear_file();
        self.events.publish(IdentityChange {
            event: AuthEvent::SignedOut,
            identity: None,
        });

        if let Some(session) = previous {
            tracing::info!("Signed out {}", session.user.email);
            let ctx = self.ctx.clone();
            std::thread::spawn(move || {
                let result =
                    ctx.block_on(sign_out(ctx.http(), ctx.config(), &session.access_token));
                if let Err(e) = result {
                    tracing::warn!("Remote sign-out failed: {}", e);
                }
            });
        }
    }

    /// Apply settled auth work and start a silent refresh when the access
    /// token is about to expire. Called once per frame.
    pub fn poll(&mut self) {
        self.poll_pending();

        if self.pending.is_none() {
            let now = chrono::Utc::now().timestamp();
            let refresh = self
                .session
                .as_ref()
                .filter(|s| s.refresh_due(now, REFRESH_MARGIN_SECS))
                .map(|s| s.refresh_token.clone());
            if let Some(refresh_token) = refresh {
                tracing::debug!("Access token near expiry, refreshing");
                self.spawn_refresh(AuthTask::Refresh, refresh_token);
            }
        }
    }

    fn poll_pending(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        let result = match pending.result.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("Auth worker exited without a result");
                self.pending = None;
                return;
            }
        };
        let task = pending.task;
        self.pending = None;

        match result {
            Ok(session) => {
                let event = match task {
                    AuthTask::Restore => AuthEvent::Restored,
                    AuthTask::Login => AuthEvent::SignedIn,
                    AuthTask::Refresh => AuthEvent::TokenRefreshed,
                };
                tracing::info!("Authenticated as {} ({:?})", session.user.email, event);
                self.set_session(session, event);
            }
            Err(e) if task == AuthTask::Login => {
                tracing::warn!("Sign-in failed: {}", e);
            }
            Err(e) => {
                tracing::warn!("Session refresh failed: {}", e);
                // A rejected token will never work again; a network failure might.
                if matches!(e, AuthError::Http { .. } | AuthError::Shape(_)) {
                    self.clear_file();
                }
                self.ctx.set_access_token(None);
                if self.session.take().is_some() {
                    self.events.publish(IdentityChange {
                        event: AuthEvent::SignedOut,
                        identity: None,
                    });
                }
            }
        }
    }

    fn set_session(&mut self, session: AuthSession, event: AuthEvent) {
        self.ctx.set_access_token(Some(session.access_token.clone()));
        if let Some(file) = &self.file {
            if let Err(e) = file.save(&session) {
                tracing::warn!("Failed to persist session: {}", e);
            }
        }
        let identity = session.user.clone();
        self.session = Some(session);
        self.events.publish(IdentityChange {
            event,
            identity: Some(identity),
        });
    }

    fn spawn_refresh(&mut self, task: AuthTask, refresh_token: String) {
        let (tx, rx) = mpsc::channel();
        let ctx = self.ctx.clone();
        std::thread::spawn(move || {
            let result = ctx.block_on(refresh_session(ctx.http(), ctx.config(), refresh_token));
            let _ = tx.send(result);
        });
        self.pending = Some(PendingAuth {
            task,
            result: rx,
            _cancel: None,
            authorize_url: None,
        });
    }

    fn clear_file(&self) {
        if let Some(file) = &self.file {
            if let Err(e) = file.clear() {
                tracing::warn!("Failed to remove session file: {}", e);
            }
        }
    }
}
