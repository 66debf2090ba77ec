//! OAuth error types.

use thiserror::Error;

/// Errors that can occur during the web authorization flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The callback's state does not match the one issued.
    #[error("Invalid state parameter. This may be a CSRF attack.")]
    CsrfStateMismatch,

    /// No state was stored for this session, or none came back.
    #[error("No pending authorization. Please start the login again.")]
    MissingState,

    /// Client id or token proxy is not configured.
    #[error("OAuth is not configured")]
    NotConfigured,

    /// The token proxy rejected the request (HTTP 400).
    #[error("Invalid token request: {0}")]
    InvalidRequest(String),

    /// The token proxy could not complete the exchange upstream (HTTP 502).
    #[error("Token exchange failed (HTTP {status})")]
    ExchangeFailed { status: u16 },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response from the token proxy.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The provider redirected back with an error.
    #[error("GitHub error: {message}")]
    Provider { message: String },
}

impl OAuthError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }
}
