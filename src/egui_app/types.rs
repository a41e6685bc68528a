/**
 * Shared Types Module
 *
 * App view states and the request bodies sent to the auth gateway.
 */

use serde::{Deserialize, Serialize};

/// Current app view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    /// A persisted session is being recovered
    Restoring,
    /// Sign-in screen
    Login,
    /// Bookmark list and form
    Bookmarks,
}

/// Body of `POST /auth/v1/token?grant_type=pkce`
#[derive(Debug, Clone, Serialize)]
pub struct PkceExchangeRequest {
    pub auth_code: String,
    pub code_verifier: String,
}

/// Body of `POST /auth/v1/token?grant_type=refresh_token`
#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Query string of the provider redirect
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// The authorization code, or the provider's reason for not sending one.
    pub fn into_code(self) -> Result<String, String> {
        match (self.code, self.error) {
            (Some(code), _) if !code.is_empty() => Ok(code),
            (_, Some(error)) => Err(match self.error_description {
                Some(description) => format!("{}: {}", error, description),
                None => error,
            }),
            _ => Err("redirect carried no authorization code".to_string()),
        }
    }
}
