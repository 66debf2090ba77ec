//! GitHub REST client built on the [`HttpTransport`] boundary.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{GitHubError, Result};
use super::types::RateLimitResponse;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpRequest, HttpResponse, HttpTransport};
use crate::pacing::{FixedDelay, Pacer};
use crate::rate_limit::{ApiRateLimiter, RateLimitInfo, RateLimitTracker, parse_rate_limit_headers};

/// Default GitHub API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// GitHub API client.
///
/// Cloning is cheap; clones share the transport, the pacer and the rate
/// limit tracker.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    token: Option<String>,
    rate_limits: RateLimitTracker,
    pacer: Arc<dyn Pacer>,
    /// Optional proactive limiter for pacing API requests.
    rate_limiter: Option<ApiRateLimiter>,
}

impl GitHubClient {
    /// Create a client talking to `api.github.com` over reqwest.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = GitHubClient::new(Some(&token))?;
    /// let meta = client.get_repo_meta(&RepoRef::new("rust-lang", "cargo")).await?;
    /// ```
    pub fn new(token: Option<&str>) -> Result<Self> {
        Self::with_timeout(GITHUB_API_URL, token, DEFAULT_TIMEOUT)
    }

    /// Create a client for a custom API base with a request timeout.
    pub fn with_timeout(api_base: &str, token: Option<&str>, timeout: StdDuration) -> Result<Self> {
        let transport =
            ReqwestTransport::with_timeout(timeout).map_err(|e| GitHubError::Http(e.to_string()))?;
        Ok(Self::new_with_transport(api_base, token, Arc::new(transport)))
    }

    pub fn new_with_transport(
        api_base: &str,
        token: Option<&str>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from),
            rate_limits: RateLimitTracker::new(),
            pacer: Arc::new(FixedDelay::default()),
            rate_limiter: None,
        }
    }

    /// Replace the pause used between sequential requests.
    #[must_use]
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Publish rate limit snapshots into an existing tracker.
    #[must_use]
    pub fn with_rate_limit_tracker(mut self, tracker: RateLimitTracker) -> Self {
        self.rate_limits = tracker;
        self
    }

    /// Throttle requests client-side.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: ApiRateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Whether requests carry a bearer token.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Tracker holding the most recent rate limit snapshot.
    #[must_use]
    pub fn rate_limits(&self) -> &RateLimitTracker {
        &self.rate_limits
    }

    /// Wait between two sequential requests.
    pub(crate) async fn pause(&self) {
        self.pacer.pause().await;
    }

    fn headers(&self) -> HttpHeaders {
        let mut headers = vec![
            (
                "Accept".to_string(),
                "application/vnd.github+json".to_string(),
            ),
            ("User-Agent".to_string(), "repoguru".to_string()),
            ("X-GitHub-Api-Version".to_string(), "2022-11-28".to_string()),
        ];
        if let Some(token) = &self.token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }

    /// Issue a GET and classify rate limit exhaustion.
    ///
    /// Every response, whatever its status, refreshes the rate limit tracker.
    /// Non-2xx statuses other than an exhausted 403 are returned as-is for the
    /// caller to classify.
    pub(crate) async fn send_get(&self, route: &str) -> Result<HttpResponse> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        let url = format!("{}{}", self.api_base, route);
        let response = self
            .transport
            .send(HttpRequest::get(url, self.headers()))
            .await
            .map_err(|e| GitHubError::Http(e.to_string()))?;

        let info = parse_rate_limit_headers(&response.headers);
        if let Some(info) = info {
            self.rate_limits.record(info);
        }
        debug!(
            route,
            status = response.status,
            remaining = info.map(|i| i.remaining),
            "GitHub API response"
        );

        if response.status == 403 && response.header("x-ratelimit-remaining") == Some("0") {
            let info = info.unwrap_or(RateLimitInfo {
                limit: 0,
                remaining: 0,
                reset_epoch: Utc::now().timestamp(),
            });
            return Err(GitHubError::RateLimitExceeded {
                limit: info.limit,
                remaining: info.remaining,
                reset_at: info.reset_at(),
            });
        }

        Ok(response)
    }

    /// GET a JSON resource. Any non-2xx status is an [`GitHubError::Api`].
    pub async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T> {
        let response = self.send_get(route).await?;
        if !response.is_success() {
            return Err(api_error(&response, route));
        }
        parse_body(&response, route)
    }

    /// GET a JSON resource that may legitimately be absent.
    ///
    /// 202 (GitHub still computing), 204 and 404 resolve to `None`, as does
    /// an empty 2xx body.
    pub async fn get_optional_json<T: DeserializeOwned>(&self, route: &str) -> Result<Option<T>> {
        let response = self.send_get(route).await?;
        match response.status {
            202 | 204 | 404 => Ok(None),
            _ if !response.is_success() => Err(api_error(&response, route)),
            _ if response.body.iter().all(u8::is_ascii_whitespace) => Ok(None),
            _ => parse_body(&response, route).map(Some),
        }
    }

    /// Full rate limit status for all resources.
    pub async fn get_rate_limits(&self) -> Result<RateLimitResponse> {
        self.get_json("/rate_limit").await
    }
}

pub(crate) fn api_error(response: &HttpResponse, route: &str) -> GitHubError {
    GitHubError::Api {
        status: response.status,
        endpoint: route.to_string(),
    }
}

pub(crate) fn parse_body<T: DeserializeOwned>(response: &HttpResponse, route: &str) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| GitHubError::Json {
        endpoint: route.to_string(),
        message: e.to_string(),
    })
}

/// Percent-encode each segment of a path, keeping the slashes.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
