//! GitHub API data types.
//!
//! These mirror the JSON shapes returned by the REST endpoints the analyzer
//! reads. Fields the analyzer never looks at are left out; unknown fields
//! are ignored by serde.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner (user or organization) reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub login: String,
}

/// License block of a repository response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubLicense {
    #[serde(default)]
    pub spdx_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// `GET /repos/{owner}/{repo}` and the items of repo listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub full_name: String,
    pub owner: UserRef,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub license: Option<GitHubLicense>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    /// Size in kilobytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

/// One entry of `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Recursive tree response.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeResponse {
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub tree: Vec<RawTreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// `GET /repos/{owner}/{repo}/contents/{path}` for a single file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Git identity embedded in a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitActor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// The `commit` object inside a commit listing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<GitActor>,
    #[serde(default)]
    pub committer: Option<GitActor>,
}

/// One item of `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub commit: CommitInfo,
    /// Linked GitHub account, absent when the email is not associated.
    #[serde(default)]
    pub author: Option<UserRef>,
}

impl CommitRecord {
    /// Stable identity used to attribute a commit to a contributor.
    ///
    /// Prefers the GitHub login, then the git author name, then the email.
    #[must_use]
    pub fn author_key(&self) -> String {
        if let Some(user) = &self.author {
            return user.login.clone();
        }
        let actor = self.commit.author.as_ref();
        actor
            .and_then(|a| a.name.clone().filter(|n| !n.is_empty()))
            .or_else(|| actor.and_then(|a| a.email.clone()))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Author date, falling back to the committer date.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.commit
            .author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| self.commit.committer.as_ref().and_then(|c| c.date))
    }

    /// First line of the commit message.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.commit.message.lines().next().unwrap_or("")
    }
}

/// Line totals of a commit detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub total: u64,
}

/// One changed file of a commit detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    pub filename: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changes: u64,
}

/// `GET /repos/{owner}/{repo}/commits/{sha}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub commit: CommitInfo,
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub stats: Option<CommitStats>,
    #[serde(default)]
    pub files: Vec<CommitFile>,
}

impl CommitDetail {
    /// Total changed lines, from `stats` or summed over files.
    #[must_use]
    pub fn changed_lines(&self) -> u64 {
        match self.stats {
            Some(stats) => stats.additions + stats.deletions,
            None => self.files.iter().map(|f| f.additions + f.deletions).sum(),
        }
    }
}

/// Weekly bucket of `stats/contributors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorWeek {
    /// Week start, unix seconds.
    pub w: i64,
    /// Additions.
    pub a: u64,
    /// Deletions.
    pub d: u64,
    /// Commits.
    pub c: u64,
}

/// One item of `stats/contributors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorStats {
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub weeks: Vec<ContributorWeek>,
}

/// One item of `stats/commit_activity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActivity {
    /// Commits per weekday, Sunday first.
    #[serde(default)]
    pub days: Vec<u32>,
    #[serde(default)]
    pub total: u32,
    /// Week start, unix seconds.
    pub week: i64,
}

/// `stats/participation`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    #[serde(default)]
    pub all: Vec<u32>,
    #[serde(default)]
    pub owner: Vec<u32>,
}

/// `[week, additions, deletions]` row of `stats/code_frequency`.
pub type CodeFrequencyRow = (i64, i64, i64);

/// `[day, hour, commits]` row of `stats/punch_card`.
pub type PunchCardRow = (u8, u8, u32);

/// Results of the six statistics endpoints. `None` means absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoStatistics {
    pub contributors: Option<Vec<ContributorStats>>,
    pub code_frequency: Option<Vec<CodeFrequencyRow>>,
    pub commit_activity: Option<Vec<CommitActivity>>,
    pub participation: Option<Participation>,
    pub punch_card: Option<Vec<PunchCardRow>>,
    /// Bytes of code per language.
    pub languages: Option<BTreeMap<String, u64>>,
}

/// Raw inputs of the git statistics bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitStatsData {
    pub commits: Vec<CommitRecord>,
    pub details: Vec<CommitDetail>,
    pub statistics: RepoStatistics,
}

/// A single rate limit resource entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResource {
    pub limit: u64,
    #[serde(default)]
    pub used: u64,
    pub remaining: u64,
    /// Unix timestamp when the rate limit resets.
    pub reset: i64,
}

impl RateLimitResource {
    /// Get the reset time as a DateTime.
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset, 0).unwrap_or_else(Utc::now)
    }
}

/// `GET /rate_limit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResponse {
    /// Resources keyed by name (`core`, `search`, `graphql`, ...).
    pub resources: BTreeMap<String, RateLimitResource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_response_tolerates_missing_optional_fields() {
        let json = r#"{
            "name": "guru",
            "full_name": "acme/guru",
            "owner": {"login": "acme", "id": 1},
            "stargazers_count": 42,
            "license": {"key": "mit", "spdx_id": "MIT", "name": "MIT License"},
            "extra": true
        }"#;
        let repo: GitHubRepo = serde_json::from_str(json).unwrap();
        assert_eq!(repo.owner.login, "acme");
        assert_eq!(repo.stargazers_count, 42);
        assert_eq!(repo.license.unwrap().spdx_id.as_deref(), Some("MIT"));
        assert!(repo.topics.is_empty());
        assert!(!repo.archived);
    }

    #[test]
    fn commit_author_key_falls_back_to_git_identity() {
        let json = r#"{
            "sha": "abc",
            "commit": {
                "message": "feat: add thing\n\nbody",
                "author": {"name": "Ada", "email": "ada@example.com", "date": "2024-03-04T10:00:00Z"}
            },
            "author": null
        }"#;
        let commit: CommitRecord = serde_json::from_str(json).unwrap();
        assert_eq!(commit.author_key(), "Ada");
        assert_eq!(commit.subject(), "feat: add thing");
        assert_eq!(commit.date().unwrap().to_rfc3339(), "2024-03-04T10:00:00+00:00");
    }

    #[test]
    fn commit_author_key_prefers_login() {
        let json = r#"{
            "sha": "abc",
            "commit": {"message": "x", "author": {"name": "Ada"}},
            "author": {"login": "ada-l"}
        }"#;
        let commit: CommitRecord = serde_json::from_str(json).unwrap();
        assert_eq!(commit.author_key(), "ada-l");
    }

    #[test]
    fn stats_rows_deserialize_from_arrays() {
        let freq: Vec<CodeFrequencyRow> = serde_json::from_str("[[1700000000, 10, -4]]").unwrap();
        assert_eq!(freq, vec![(1_700_000_000, 10, -4)]);
        let punch: Vec<PunchCardRow> = serde_json::from_str("[[0, 13, 7]]").unwrap();
        assert_eq!(punch, vec![(0, 13, 7)]);
    }

    #[test]
    fn changed_lines_falls_back_to_file_sums() {
        let detail = CommitDetail {
            sha: "s".into(),
            commit: CommitInfo {
                message: String::new(),
                author: None,
                committer: None,
            },
            author: None,
            stats: None,
            files: vec![
                CommitFile {
                    filename: "a".into(),
                    status: None,
                    additions: 3,
                    deletions: 1,
                    changes: 4,
                },
                CommitFile {
                    filename: "b".into(),
                    status: None,
                    additions: 2,
                    deletions: 0,
                    changes: 2,
                },
            ],
        };
        assert_eq!(detail.changed_lines(), 6);
    }

    #[test]
    fn rate_limit_response_keys_resources_by_name() {
        let json = r#"{"resources": {
            "core": {"limit": 5000, "used": 1, "remaining": 4999, "reset": 1700000000},
            "search": {"limit": 30, "used": 0, "remaining": 30, "reset": 1700000000}
        }}"#;
        let resp: RateLimitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.resources["core"].remaining, 4999);
        assert_eq!(resp.resources["search"].reset_at().timestamp(), 1_700_000_000);
    }
}
