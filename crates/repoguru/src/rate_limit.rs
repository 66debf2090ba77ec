//! GitHub rate-limit bookkeeping.
//!
//! Every API response carries `x-ratelimit-*` headers. The client parses them
//! after each call (success or failure) and publishes the result through a
//! [`RateLimitTracker`], a single-writer cell built on `tokio::sync::watch`.
//! Consumers subscribe and read; nothing in the analysis path reads it back.
//!
//! [`ApiRateLimiter`] is the optional proactive limiter: it paces requests
//! client-side before GitHub has to reject them.

use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Serialize;
use tokio::sync::watch;

use crate::http::{HttpHeaders, header_get};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limit snapshot taken from the most recent response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    /// Maximum requests allowed per window.
    pub limit: u64,
    /// Requests left in the current window.
    pub remaining: u64,
    /// Unix timestamp (seconds) at which the window resets.
    pub reset_epoch: i64,
}

impl RateLimitInfo {
    /// When the window resets, as a UTC timestamp.
    #[must_use]
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset_epoch, 0).unwrap_or_else(Utc::now)
    }

    /// Whether the quota is drained.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Fraction of the window already used, in `[0, 1]`.
    #[must_use]
    pub fn usage_ratio(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        let used = self.limit.saturating_sub(self.remaining);
        used as f64 / self.limit as f64
    }
}

fn numeric_header<T: FromStr>(headers: &HttpHeaders, name: &str) -> Option<T> {
    header_get(headers, name)?.trim().parse().ok()
}

/// Read the `x-ratelimit-*` triple; `None` if any part is missing or not a number.
#[must_use]
pub fn parse_rate_limit_headers(headers: &HttpHeaders) -> Option<RateLimitInfo> {
    Some(RateLimitInfo {
        limit: numeric_header(headers, "x-ratelimit-limit")?,
        remaining: numeric_header(headers, "x-ratelimit-remaining")?,
        reset_epoch: numeric_header(headers, "x-ratelimit-reset")?,
    })
}

/// Single-writer cell holding the latest [`RateLimitInfo`].
///
/// Cloning the tracker shares the same cell. Updates are last-write-wins.
#[derive(Clone)]
pub struct RateLimitTracker {
    tx: Arc<watch::Sender<Option<RateLimitInfo>>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Publish a new snapshot.
    pub fn record(&self, info: RateLimitInfo) {
        self.tx.send_replace(Some(info));
    }

    /// The most recent snapshot, if any response has been seen.
    #[must_use]
    pub fn latest(&self) -> Option<RateLimitInfo> {
        *self.tx.borrow()
    }

    /// Subscribe to updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<RateLimitInfo>> {
        self.tx.subscribe()
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-side request budget shared by every clone.
///
/// Requests wait in [`wait`](Self::wait) until the token bucket has room, so
/// a configured `requests_per_second` is never exceeded even when GitHub's
/// own quota would allow it.
#[derive(Clone)]
pub struct ApiRateLimiter {
    bucket: Arc<DirectLimiter>,
}

impl ApiRateLimiter {
    /// Zero is clamped to one request per second.
    pub fn new(requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second.max(1)).unwrap_or(NonZeroU32::MIN);
        Self {
            bucket: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        }
    }

    pub async fn wait(&self) {
        self.bucket.until_ready().await;
    }
}
