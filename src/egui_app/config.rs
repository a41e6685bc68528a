use std::path::{Path, PathBuf};

use crate::shared::config::AppConfig;

/// Path of the loopback route the identity provider redirects to
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Application configuration wrapper with endpoint helpers.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    session_path: Option<PathBuf>,
}

impl Config {
    /// Wrap a validated configuration; the session file goes to the default
    /// config directory.
    pub fn from_app(app: AppConfig) -> Self {
        let session_path = AppConfig::config_dir().map(|dir| dir.join("session.json"));
        Self { app, session_path }
    }

    /// Use `path` for the persisted session instead of the default location.
    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Disable session persistence.
    pub fn without_session_file(mut self) -> Self {
        self.session_path = None;
        self
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    pub fn store_url(&self) -> &str {
        &self.app.store_url
    }

    pub fn store_key(&self) -> &str {
        &self.app.store_key
    }

    pub fn table(&self) -> &str {
        &self.app.table
    }

    pub fn session_path(&self) -> Option<&Path> {
        self.session_path.as_deref()
    }

    /// REST endpoint for a table
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.store_url(), table)
    }

    /// Auth gateway endpoint
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.store_url(), path)
    }

    /// Change feed endpoint
    pub fn realtime_url(&self) -> String {
        format!("{}/realtime/v1/sse", self.store_url())
    }

    /// Where the provider sends the browser after sign-in
    pub fn callback_url(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.app.callback_port, CALLBACK_PATH)
    }
}
