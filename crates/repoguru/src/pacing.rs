//! Inter-request pacing for sequential fetch loops.
//!
//! File contents, commit details and commit-list pages are fetched one at a
//! time with a fixed pause between calls to stay clear of GitHub's abuse
//! detection. The pause is a [`Pacer`] so tests can swap in a recorder
//! instead of waiting on the wall clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

/// Default pause between sequential requests.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// Something that waits between two sequential requests.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps for a fixed duration on the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        Self(DEFAULT_PACING)
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

/// Never waits, only counts how often a pause was requested.
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    pauses: Arc<AtomicUsize>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pauses requested so far (shared across clones).
    #[must_use]
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::Relaxed);
    }
}
