//! Shared Error Types
//!
//! Error types for the three kinds of failure the client can see.
//!
//! # Error Categories
//!
//! - `StoreError` - Remote table operations (list/create/update/delete)
//! - `AuthError` - Identity provider handshake, token refresh and persistence
//! - `ValidationError` - Client-side presence checks on the bookmark form
//!
//! # Usage
//!
//! ```rust
//! use smartmarks::shared::error::StoreError;
//!
//! let error = StoreError::shape("bookmark rows", "missing field `title`");
//! assert!(error.to_string().contains("bookmark rows"));
//! ```
//!
//! Remote errors are logged at the point of occurrence and never escalated;
//! the types exist so the log line says what went wrong.
use thiserror::Error;
use uuid::Uuid;

/// Failure of a remote table operation
#[derive(Debug, Error)]
pub enum StoreError {
    /// No access token is available for the request
    #[error("not authenticated")]
    NotAuthenticated,

    /// Transport failure (DNS, TLS, connection reset, ...)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("request failed: {status} - {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// The response did not match the expected record shape
    #[error("malformed {what}: {message}")]
    Shape {
        /// What was being parsed
        what: &'static str,
        /// Parser message
        message: String,
    },

    /// A listed row belongs to a different owner than the one queried
    #[error("row {id} belongs to {actual}, not {expected}")]
    ForeignRow {
        id: Uuid,
        expected: Uuid,
        actual: Uuid,
    },
}

impl StoreError {
    pub fn shape(what: &'static str, message: impl Into<String>) -> Self {
        Self::Shape {
            what,
            message: message.into(),
        }
    }

    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }
}

/// Failure of the sign-in handshake, a token refresh or session persistence
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth request failed: {status} - {body}")]
    Http { status: u16, body: String },

    #[error("malformed auth response: {0}")]
    Shape(#[from] serde_json::Error),

    /// The provider redirect never arrived or carried an error
    #[error("sign-in callback failed: {0}")]
    Callback(String),

    /// Reading or writing the persisted session failed
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl AuthError {
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }
}

/// Client-side validation failure on the bookmark form
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField {
        /// Name of the empty field
        field: &'static str,
    },
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}
