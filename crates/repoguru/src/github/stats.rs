//! Commit history and statistics endpoints.
//!
//! Fetching runs in three stages: the paginated commit list, optional
//! per-commit details (sequential, paced, capped at [`MAX_COMMIT_DETAILS`]),
//! and the six statistics endpoints issued together.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::client::GitHubClient;
use super::error::{GitHubError, Result};
use super::pagination::PaginatedFetchConfig;
use super::types::{
    CodeFrequencyRow, CommitActivity, CommitDetail, CommitRecord, ContributorStats, GitStatsData,
    Participation, PunchCardRow, RepoStatistics,
};
use crate::progress::{AnalysisProgress, ProgressCallback, emit};
use crate::repo_ref::RepoRef;

/// Upper bound on per-commit detail requests for one repository.
pub const MAX_COMMIT_DETAILS: usize = 200;

/// Pick at most `max` shas spread evenly over `shas`.
///
/// Index `i * n / max` is kept for `i in 0..max`, so the first sha always
/// survives and the picks are strictly increasing.
#[must_use]
pub fn sample_evenly<T: Clone>(items: &[T], max: usize) -> Vec<T> {
    let n = items.len();
    if n <= max {
        return items.to_vec();
    }
    (0..max).map(|i| items[i * n / max].clone()).collect()
}

impl GitHubClient {
    /// Fetch the full commit list of a repository (newest first).
    ///
    /// A repository without commits yields an empty list.
    pub async fn fetch_commit_list(
        &self,
        owner: &str,
        repo: &str,
        branch: Option<&str>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<CommitRecord>> {
        self.fetch_pages(
            &PaginatedFetchConfig::commits(owner, repo, branch),
            on_progress,
        )
        .await
    }

    /// Fetch commit details one by one, downsampling to [`MAX_COMMIT_DETAILS`].
    ///
    /// A sha whose detail request fails is left out of the result. An
    /// exhausted rate limit aborts the batch.
    pub async fn fetch_commit_details(
        &self,
        owner: &str,
        repo: &str,
        shas: &[String],
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<CommitDetail>> {
        let sampled = sample_evenly(shas, MAX_COMMIT_DETAILS);
        if sampled.len() < shas.len() {
            debug!(
                owner,
                repo,
                total = shas.len(),
                sampled = sampled.len(),
                "Downsampled commit details"
            );
        }
        emit(
            on_progress,
            AnalysisProgress::FetchingCommitDetails {
                total: sampled.len(),
            },
        );

        let mut details = Vec::with_capacity(sampled.len());
        for (i, sha) in sampled.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            let route = format!("/repos/{owner}/{repo}/commits/{sha}");
            match self.get_json::<CommitDetail>(&route).await {
                Ok(detail) => details.push(detail),
                Err(e @ GitHubError::RateLimitExceeded { .. }) => return Err(e),
                Err(e) => warn!(sha = %sha, error = %e, "Skipping commit detail"),
            }
            emit(
                on_progress,
                AnalysisProgress::CommitDetailFetched {
                    index: i + 1,
                    total: sampled.len(),
                },
            );
        }
        Ok(details)
    }

    /// Fetch the six statistics endpoints concurrently.
    ///
    /// Each endpoint settles on its own: absence and non-rate-limit failures
    /// become `None`. If any endpoint hit the rate limit, the error is
    /// returned once all six have settled.
    pub async fn fetch_all_stats(&self, owner: &str, repo: &str) -> Result<RepoStatistics> {
        let base = format!("/repos/{owner}/{repo}");
        let contributors_route = format!("{base}/stats/contributors");
        let code_frequency_route = format!("{base}/stats/code_frequency");
        let commit_activity_route = format!("{base}/stats/commit_activity");
        let participation_route = format!("{base}/stats/participation");
        let punch_card_route = format!("{base}/stats/punch_card");
        let languages_route = format!("{base}/languages");

        let (contributors, code_frequency, commit_activity, participation, punch_card, languages) = tokio::join!(
            self.get_optional_json::<Vec<ContributorStats>>(&contributors_route),
            self.get_optional_json::<Vec<CodeFrequencyRow>>(&code_frequency_route),
            self.get_optional_json::<Vec<CommitActivity>>(&commit_activity_route),
            self.get_optional_json::<Participation>(&participation_route),
            self.get_optional_json::<Vec<PunchCardRow>>(&punch_card_route),
            self.get_optional_json::<BTreeMap<String, u64>>(&languages_route),
        );

        let mut rate_limited = None;
        let statistics = RepoStatistics {
            contributors: settle(&contributors_route, contributors, &mut rate_limited),
            code_frequency: settle(&code_frequency_route, code_frequency, &mut rate_limited),
            commit_activity: settle(&commit_activity_route, commit_activity, &mut rate_limited),
            participation: settle(&participation_route, participation, &mut rate_limited),
            punch_card: settle(&punch_card_route, punch_card, &mut rate_limited),
            languages: settle(&languages_route, languages, &mut rate_limited),
        };

        match rate_limited {
            Some(e) => Err(e),
            None => Ok(statistics),
        }
    }

    /// Run the whole history fetch for one repository.
    ///
    /// Commit details need an authenticated client and at least one commit;
    /// otherwise that stage is skipped without issuing requests.
    pub async fn fetch_git_stats_data(
        &self,
        repo: &RepoRef,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<GitStatsData> {
        let (owner, name) = (repo.owner.as_str(), repo.repo.as_str());
        let commits = self
            .fetch_commit_list(owner, name, repo.branch.as_deref(), on_progress)
            .await?;

        let details = if self.has_token() && !commits.is_empty() {
            let shas: Vec<String> = commits.iter().map(|c| c.sha.clone()).collect();
            self.fetch_commit_details(owner, name, &shas, on_progress)
                .await?
        } else {
            debug!(
                owner,
                repo = name,
                has_token = self.has_token(),
                commits = commits.len(),
                "Skipping commit details"
            );
            Vec::new()
        };

        emit(on_progress, AnalysisProgress::FetchingStatistics);
        let statistics = self.fetch_all_stats(owner, name).await?;

        info!(
            owner,
            repo = name,
            commits = commits.len(),
            details = details.len(),
            "Fetched git history"
        );
        Ok(GitStatsData {
            commits,
            details,
            statistics,
        })
    }
}

fn settle<T>(
    route: &str,
    result: Result<Option<T>>,
    rate_limited: &mut Option<GitHubError>,
) -> Option<T> {
    match result {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            debug!(route, "Statistics not available");
            None
        }
        Err(e @ GitHubError::RateLimitExceeded { .. }) => {
            rate_limited.get_or_insert(e);
            None
        }
        Err(e) => {
            warn!(route, error = %e, "Statistics endpoint failed");
            None
        }
    }
}
