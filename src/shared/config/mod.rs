//! Application configuration module
//!
//! Two values are required to talk to the store: its endpoint and its public
//! (anon) key. The rest have defaults. Sources are layered: built-in defaults,
//! then `<config_dir>/smartmarks/config.toml`, then `SMARTMARKS_*`
//! environment variables.

use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

/// Identity provider used when none is configured
pub const DEFAULT_OAUTH_PROVIDER: &str = "google";
/// Loopback port the OAuth redirect lands on
pub const DEFAULT_CALLBACK_PORT: u16 = 54321;
/// Remote table holding bookmark rows
pub const DEFAULT_TABLE: &str = "bookmarks";

pub const ENV_STORE_URL: &str = "SMARTMARKS_STORE_URL";
pub const ENV_STORE_KEY: &str = "SMARTMARKS_STORE_KEY";
pub const ENV_OAUTH_PROVIDER: &str = "SMARTMARKS_OAUTH_PROVIDER";
pub const ENV_CALLBACK_PORT: &str = "SMARTMARKS_CALLBACK_PORT";

/// Validated application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Store endpoint, without trailing slash
    pub store_url: String,
    /// Store public key, sent as `apikey` on every request
    pub store_key: String,
    pub oauth_provider: String,
    pub callback_port: u16,
    pub table: String,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Directory holding `config.toml` and the persisted session
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("smartmarks"))
    }

    /// Load from the default file (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match Self::config_dir() {
            Some(dir) => AppConfigBuilder::from_file(&dir.join("config.toml"))?,
            None => AppConfigBuilder::default(),
        };
        file.merge(AppConfigBuilder::from_env()?).build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.store_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.store_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                self.store_url
            )));
        }
        if self.store_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("store_key"));
        }
        if self.table.trim().is_empty() {
            return Err(ConfigError::MissingValue("table"));
        }
        Ok(())
    }
}

/// Builder for AppConfig. Also the shape of `config.toml`.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfigBuilder {
    store_url: Option<String>,
    store_key: Option<String>,
    oauth_provider: Option<String>,
    callback_port: Option<u16>,
    table: Option<String>,
}

impl AppConfigBuilder {
    /// Set the store endpoint
    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.store_url = Some(url.into());
        self
    }

    /// Set the store public key
    pub fn store_key(mut self, key: impl Into<String>) -> Self {
        self.store_key = Some(key.into());
        self
    }

    pub fn oauth_provider(mut self, provider: impl Into<String>) -> Self {
        self.oauth_provider = Some(provider.into());
        self
    }

    pub fn callback_port(mut self, port: u16) -> Self {
        self.callback_port = Some(port);
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::File(e.to_string()))
    }

    /// Read a TOML file; a missing file yields an empty builder.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::File(format!("{}: {}", path.display(), e))),
        }
    }

    /// Read `SMARTMARKS_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `SMARTMARKS_*` variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let callback_port = match lookup(ENV_CALLBACK_PORT) {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_CALLBACK_PORT,
                value: raw,
            })?),
            None => None,
        };
        Ok(Self {
            store_url: lookup(ENV_STORE_URL),
            store_key: lookup(ENV_STORE_KEY),
            oauth_provider: lookup(ENV_OAUTH_PROVIDER),
            callback_port,
            table: None,
        })
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: AppConfigBuilder) -> Self {
        Self {
            store_url: other.store_url.or(self.store_url),
            store_key: other.store_key.or(self.store_key),
            oauth_provider: other.oauth_provider.or(self.oauth_provider),
            callback_port: other.callback_port.or(self.callback_port),
            table: other.table.or(self.table),
        }
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let store_url = self
            .store_url
            .ok_or(ConfigError::MissingValue("store_url"))?
            .trim()
            .trim_end_matches('/')
            .to_string();
        let store_key = self.store_key.ok_or(ConfigError::MissingValue("store_key"))?;
        let config = AppConfig {
            store_url,
            store_key,
            oauth_provider: self
                .oauth_provider
                .unwrap_or_else(|| DEFAULT_OAUTH_PROVIDER.to_string()),
            callback_port: self.callback_port.unwrap_or(DEFAULT_CALLBACK_PORT),
            table: self.table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("config file: {0}")]
    File(String),
}
