//! Shared Module
//!
//! Types that describe the remote store and the identity provider without
//! depending on the UI. Everything here is plain data plus serde rules, so the
//! wire shapes are checked in one place.

/// Bookmark rows and insert/patch payloads
pub mod bookmark;

/// Authenticated principal and session tokens
pub mod identity;

/// Change notification events
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use bookmark::{Bookmark, BookmarkPatch, NewBookmark};
pub use identity::{AuthSession, Identity};
pub use event::{ChangeEvent, ChangeOperation};
pub use error::{AuthError, StoreError, ValidationError};
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
