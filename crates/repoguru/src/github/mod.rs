//! GitHub REST API access.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for GitHub API operations
//! - [`types`] - Wire types of the endpoints the analyzer reads
//! - `client` - Authenticated GET with rate limit classification
//! - `pagination` - Page-indexed listing with short-page termination
//! - `repo` - Metadata, recursive tree, contents and repository listings
//! - `stats` - Commit list, commit details and statistics endpoints

mod client;
pub mod error;
mod pagination;
mod repo;
mod stats;
pub mod types;

pub use client::{DEFAULT_TIMEOUT, GITHUB_API_URL, GitHubClient};
pub use error::{GitHubError, short_error_message};
pub use pagination::{PAGE_SIZE, PaginatedFetchConfig};
pub use stats::{MAX_COMMIT_DETAILS, sample_evenly};
pub use types::{
    CommitDetail, CommitRecord, GitHubRepo, GitStatsData, RateLimitResponse, RepoStatistics,
};

#[cfg(test)]
pub(crate) use client::test_support;
