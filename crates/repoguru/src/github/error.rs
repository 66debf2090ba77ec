//! GitHub API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// 403 with an exhausted quota. Fatal to the current run.
    #[error(
        "GitHub API rate limit exceeded ({remaining} of {limit} requests remaining). Resets at {reset_at}"
    )]
    RateLimitExceeded {
        limit: u64,
        remaining: u64,
        reset_at: DateTime<Utc>,
    },

    /// Any other non-2xx response.
    #[error("GitHub API error {status} for {endpoint}")]
    Api { status: u16, endpoint: String },

    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A 2xx response whose body did not match the expected shape.
    #[error("Failed to parse response from {endpoint}: {message}")]
    Json { endpoint: String, message: String },

    #[error("Invalid repository reference: {0}")]
    InvalidRepoRef(String),
}

impl GitHubError {
    /// Check if this error is a rate limit error.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimitExceeded { .. } => Some(403),
            _ => None,
        }
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

/// Result type for GitHub operations.
pub type Result<T> = std::result::Result<T, GitHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_message_surfaces_reset_and_remaining() {
        let reset_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let err = GitHubError::RateLimitExceeded {
            limit: 60,
            remaining: 0,
            reset_at,
        };
        let msg = err.to_string();
        assert!(msg.contains("rate limit exceeded"));
        assert!(msg.contains("0 of 60"));
        assert!(msg.contains("2023-11-14"));
        assert!(err.is_rate_limited());
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn api_error_carries_status_and_endpoint() {
        let err = GitHubError::Api {
            status: 500,
            endpoint: "/repos/o/r/commits?per_page=100&page=1".to_string(),
        };
        assert!(!err.is_rate_limited());
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("/repos/o/r/commits"));
    }

    #[test]
    fn short_error_message_takes_first_line() {
        let err = GitHubError::Http("connection reset\nbacktrace...".to_string());
        assert_eq!(short_error_message(&err), "HTTP error: connection reset");
        assert_eq!(GitHubError::Http("x".into()).status(), None);
    }
}
