//! Identity and session tokens
//!
//! [`Identity`] is the authenticated principal shown in the UI and used as
//! the owner scope for every table query. [`AuthSession`] carries the tokens
//! issued alongside it. Both are parsed from the auth gateway's token
//! response; the user object must carry a uuid `id` and a string `email`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user principal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// Token response from `/auth/v1/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of `access_token` in seconds
    pub expires_in: i64,
    /// Absolute expiry (unix seconds); older gateways omit it
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Identity,
}

/// A session younger than this is never refreshed, whatever its lifetime.
pub const MIN_REFRESH_AGE_SECS: i64 = 5;

/// A live session: identity plus the tokens that authorize requests for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds when the tokens were received
    pub issued_at: i64,
    /// Unix seconds after which `access_token` is rejected
    pub expires_at: i64,
    pub user: Identity,
}

impl AuthSession {
    /// Build a session from a token response received at `now` (unix seconds).
    pub fn from_response(response: TokenResponse, now: i64) -> Self {
        let expires_at = response
            .expires_at
            .unwrap_or(now + response.expires_in);
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            issued_at: now,
            expires_at,
            user: response.user,
        }
    }

    /// True when the access token should be renewed at `now`.
    ///
    /// The margin is capped at half the token lifetime, so a short-lived
    /// token is not due the moment it arrives.
    pub fn refresh_due(&self, now: i64, margin_secs: i64) -> bool {
        if now - self.issued_at < MIN_REFRESH_AGE_SECS {
            return false;
        }
        let lifetime = (self.expires_at - self.issued_at).max(0);
        self.expires_at - now <= margin_secs.min(lifetime / 2)
    }
}
