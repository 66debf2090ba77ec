//! Light analysis across every repository of an organization or user.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::Category;
use crate::github::error::Result;
use crate::github::{GitHubClient, GitHubError, GitHubRepo};
use crate::pipeline::analyze_light;
use crate::progress::{AnalysisProgress, ProgressCallback, emit};
use crate::repo_ref::RepoRef;
use crate::report::AnalysisReport;

/// Repositories analyzed by an org scan unless told otherwise.
pub const DEFAULT_ORG_LIMIT: usize = 20;

/// Repositories analyzed by a user portfolio unless told otherwise.
pub const DEFAULT_USER_LIMIT: usize = 15;

/// One analyzed (or failed) repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRow {
    pub repo: String,
    pub stars: u64,
    pub overall_score: Option<u8>,
    pub grade: Option<char>,
    pub scores: BTreeMap<Category, u8>,
    pub error: Option<String>,
}

impl ScanRow {
    fn analyzed(repo: &GitHubRepo, report: &AnalysisReport) -> Self {
        Self {
            repo: repo.full_name.clone(),
            stars: repo.stargazers_count,
            overall_score: Some(report.overall_score),
            grade: Some(report.grade),
            scores: report
                .categories
                .iter()
                .map(|c| (c.category, c.score))
                .collect(),
            error: None,
        }
    }

    fn failed(repo: &GitHubRepo, error: &GitHubError) -> Self {
        Self {
            repo: repo.full_name.clone(),
            stars: repo.stargazers_count,
            overall_score: None,
            grade: None,
            scores: BTreeMap::new(),
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Organization or user name.
    pub namespace: String,
    /// Rows in descending star order.
    pub rows: Vec<ScanRow>,
    /// Number of repositories per letter grade.
    pub grade_distribution: BTreeMap<char, usize>,
    /// Rounded mean score per category over the analyzed repositories.
    pub category_averages: BTreeMap<Category, u8>,
}

impl ScanReport {
    fn from_rows(namespace: &str, rows: Vec<ScanRow>) -> Self {
        let mut grade_distribution = BTreeMap::new();
        let mut sums: BTreeMap<Category, (u32, u32)> = BTreeMap::new();
        for row in &rows {
            if let Some(grade) = row.grade {
                *grade_distribution.entry(grade).or_insert(0) += 1;
            }
            for (&category, &score) in &row.scores {
                let (sum, count) = sums.entry(category).or_insert((0, 0));
                *sum += u32::from(score);
                *count += 1;
            }
        }
        let category_averages = sums
            .into_iter()
            .map(|(category, (sum, count))| {
                let mean = (sum + count / 2) / count;
                (category, u8::try_from(mean).unwrap_or(100))
            })
            .collect();

        Self {
            namespace: namespace.to_string(),
            rows,
            grade_distribution,
            category_averages,
        }
    }

    /// Rows whose analysis failed.
    pub fn failures(&self) -> impl Iterator<Item = &ScanRow> {
        self.rows.iter().filter(|r| r.error.is_some())
    }
}

/// Keep the `limit` most-starred candidates; ties keep listing order.
fn pick(mut repos: Vec<GitHubRepo>, skip_forks: bool, limit: usize) -> Vec<GitHubRepo> {
    repos.retain(|r| !r.archived && !(skip_forks && r.fork));
    repos.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    repos.truncate(limit);
    repos
}

async fn scan(
    client: &GitHubClient,
    namespace: &str,
    repos: Vec<GitHubRepo>,
    on_progress: Option<&ProgressCallback>,
) -> Result<ScanReport> {
    emit(
        on_progress,
        AnalysisProgress::ScanStarted {
            namespace: namespace.to_string(),
            count: repos.len(),
        },
    );

    let mut rows = Vec::with_capacity(repos.len());
    for repo in &repos {
        let repo_ref = RepoRef::new(repo.owner.login.as_str(), repo.name.as_str());
        let row = match analyze_light(client, &repo_ref, None).await {
            Ok(report) => ScanRow::analyzed(repo, &report),
            Err(e @ GitHubError::RateLimitExceeded { .. }) => return Err(e),
            Err(e) => {
                warn!(repo = %repo.full_name, error = %e, "Skipping repository");
                ScanRow::failed(repo, &e)
            }
        };
        emit(
            on_progress,
            AnalysisProgress::ScanRepoFinished {
                repo: row.repo.clone(),
                grade: row.grade,
                error: row.error.clone(),
            },
        );
        rows.push(row);
    }

    let report = ScanReport::from_rows(namespace, rows);
    info!(
        namespace,
        analyzed = report.rows.len() - report.failures().count(),
        failed = report.failures().count(),
        "Scan complete"
    );
    Ok(report)
}

/// Light-analyze the most-starred non-archived repositories of an org.
pub async fn scan_org(
    client: &GitHubClient,
    org: &str,
    limit: usize,
    on_progress: Option<&ProgressCallback>,
) -> Result<ScanReport> {
    let repos = client.list_org_repos(org, on_progress).await?;
    scan(client, org, pick(repos, false, limit), on_progress).await
}

/// Light-analyze a user's most-starred own repositories.
///
/// Forks and archived repositories are left out.
pub async fn scan_user(
    client: &GitHubClient,
    user: &str,
    limit: usize,
    on_progress: Option<&ProgressCallback>,
) -> Result<ScanReport> {
    let repos = client.list_user_repos(user, on_progress).await?;
    scan(client, user, pick(repos, true, limit), on_progress).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::test_support::{
        json_response, mock_client, push, rate_limited_response, status_response,
    };

    fn listing(entries: &[(&str, u64, bool, bool)]) -> String {
        let repos: Vec<serde_json::Value> = entries
            .iter()
            .map(|(name, stars, archived, fork)| {
                serde_json::json!({
                    "name": name,
                    "full_name": format!("acme/{name}"),
                    "owner": {"login": "acme"},
                    "default_branch": "main",
                    "stargazers_count": stars,
                    "archived": archived,
                    "fork": fork,
                })
            })
            .collect();
        serde_json::Value::Array(repos).to_string()
    }

    fn meta(name: &str) -> String {
        format!(
            r#"{{"name": "{name}", "full_name": "acme/{name}", "owner": {{"login": "acme"}},
                "default_branch": "main"}}"#
        )
    }

    fn push_repo(transport: &crate::http::MockTransport, name: &str, tree: &str) {
        push(transport, &format!("/repos/acme/{name}"), json_response(200, &meta(name)));
        push(
            transport,
            &format!("/repos/acme/{name}/git/trees/main?recursive=1"),
            json_response(200, tree),
        );
    }

    const README_TREE: &str = r#"{"tree": [{"path": "README.md", "type": "blob"}]}"#;
    const EMPTY_TREE: &str = r#"{"tree": []}"#;

    #[tokio::test]
    async fn org_scan_skips_archived_and_orders_by_stars() {
        let (client, transport, _) = mock_client(None);
        push(
            &transport,
            "/orgs/acme/repos?per_page=100&page=1",
            json_response(
                200,
                &listing(&[
                    ("small", 1, false, false),
                    ("old", 500, true, false),
                    ("big", 90, false, true),
                    ("mid", 10, false, false),
                ]),
            ),
        );
        push_repo(&transport, "big", README_TREE);
        push_repo(&transport, "mid", EMPTY_TREE);

        let report = scan_org(&client, "acme", 2, None).await.unwrap();

        let names: Vec<&str> = report.rows.iter().map(|r| r.repo.as_str()).collect();
        assert_eq!(names, ["acme/big", "acme/mid"]);
        assert_eq!(transport.request_count(), 5);
        assert_eq!(report.grade_distribution.values().sum::<usize>(), 2);
        // README presence alone (25) averaged with nothing (0).
        assert_eq!(report.category_averages[&Category::Documentation], 13);
    }

    #[tokio::test]
    async fn user_scan_skips_forks() {
        let (client, transport, _) = mock_client(None);
        push(
            &transport,
            "/users/acme/repos?per_page=100&page=1",
            json_response(
                200,
                &listing(&[("fork", 100, false, true), ("own", 1, false, false)]),
            ),
        );
        push_repo(&transport, "own", EMPTY_TREE);

        let report = scan_user(&client, "acme", DEFAULT_USER_LIMIT, None)
            .await
            .unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].repo, "acme/own");
    }

    #[tokio::test]
    async fn failed_repository_is_recorded_and_scan_continues() {
        let (client, transport, _) = mock_client(None);
        push(
            &transport,
            "/orgs/acme/repos?per_page=100&page=1",
            json_response(
                200,
                &listing(&[("gone", 5, false, false), ("ok", 1, false, false)]),
            ),
        );
        push(&transport, "/repos/acme/gone", status_response(404));
        push_repo(&transport, "ok", EMPTY_TREE);

        let report = scan_org(&client, "acme", DEFAULT_ORG_LIMIT, None)
            .await
            .unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.failures().count(), 1);
        assert!(report.rows[0].error.is_some());
        assert!(report.rows[1].grade.is_some());
        assert_eq!(report.grade_distribution.values().sum::<usize>(), 1);
    }

    #[tokio::test]
    async fn rate_limit_aborts_the_scan() {
        let (client, transport, _) = mock_client(None);
        push(
            &transport,
            "/orgs/acme/repos?per_page=100&page=1",
            json_response(
                200,
                &listing(&[("a", 5, false, false), ("b", 1, false, false)]),
            ),
        );
        push(&transport, "/repos/acme/a", rate_limited_response());

        let err = scan_org(&client, "acme", DEFAULT_ORG_LIMIT, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::RateLimitExceeded { .. }));
        assert_eq!(transport.request_count(), 2);
    }
}
