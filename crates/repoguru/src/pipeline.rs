//! End-to-end analysis runs.
//!
//! A full run is: metadata, one recursive tree call, file selection,
//! sequential content downloads, the eight analyzers and aggregation. Fetch
//! errors propagate; everything after the downloads is infallible.

use tracing::info;

use crate::git_stats::GitStatsBundle;
use crate::github::GitHubClient;
use crate::github::error::Result;
use crate::progress::{AnalysisProgress, ProgressCallback, emit};
use crate::repo_ref::RepoRef;
use crate::report::{AnalysisMode, AnalysisReport, ReportContext};
use crate::selection::select_files;
use crate::snapshot::{RepoMeta, RepoSnapshot, Tree};

/// Metadata plus the tree of the requested (or default) branch.
async fn fetch_meta_and_tree(
    client: &GitHubClient,
    repo: &RepoRef,
    on_progress: Option<&ProgressCallback>,
) -> Result<(RepoMeta, String, Tree)> {
    emit(
        on_progress,
        AnalysisProgress::FetchingMetadata {
            repo: repo.full_name(),
        },
    );
    let meta = client.get_repo_meta(repo).await?;
    let branch = repo
        .branch
        .clone()
        .unwrap_or_else(|| meta.default_branch.clone());

    emit(
        on_progress,
        AnalysisProgress::FetchingTree {
            repo: repo.full_name(),
            branch: branch.clone(),
        },
    );
    let tree = client.get_tree(&repo.owner, &repo.repo, &branch).await?;
    emit(
        on_progress,
        AnalysisProgress::TreeFetched {
            entries: tree.entries.len(),
            truncated: tree.truncated,
        },
    );
    Ok((meta, branch, tree))
}

fn finish(report: AnalysisReport, on_progress: Option<&ProgressCallback>) -> AnalysisReport {
    info!(
        repo = %report.repo_meta.full_name,
        score = report.overall_score,
        grade = %report.grade,
        "Analysis complete"
    );
    emit(
        on_progress,
        AnalysisProgress::AnalysisComplete {
            repo: report.repo_meta.full_name.clone(),
            overall_score: report.overall_score,
            grade: report.grade,
        },
    );
    report
}

/// Analyze one repository with file contents.
pub async fn analyze_repo(
    client: &GitHubClient,
    repo: &RepoRef,
    on_progress: Option<&ProgressCallback>,
) -> Result<AnalysisReport> {
    let (meta, branch, tree) = fetch_meta_and_tree(client, repo, on_progress).await?;

    let selected = select_files(&tree.entries);
    info!(
        repo = %repo.full_name(),
        branch = %branch,
        entries = tree.entries.len(),
        selected = selected.len(),
        "Selected files"
    );
    emit(
        on_progress,
        AnalysisProgress::FilesSelected {
            count: selected.len(),
        },
    );

    let contents = client
        .fetch_file_contents(&repo.owner, &repo.repo, &branch, &selected, on_progress)
        .await?;

    let snapshot = RepoSnapshot::new(tree.entries, contents, meta.license_spdx.clone());
    let context = ReportContext {
        repo_meta: meta,
        branch,
        mode: AnalysisMode::Full,
        selected_files: selected,
        tree_truncated: tree.truncated,
    };
    Ok(finish(AnalysisReport::build(context, &snapshot), on_progress))
}

/// Analyze one repository from its tree listing alone.
///
/// Two API calls: metadata and tree. Content-based signals come out as not
/// found, so scores are lower bounds of a full analysis.
pub async fn analyze_light(
    client: &GitHubClient,
    repo: &RepoRef,
    on_progress: Option<&ProgressCallback>,
) -> Result<AnalysisReport> {
    let (meta, branch, tree) = fetch_meta_and_tree(client, repo, on_progress).await?;
    let snapshot = RepoSnapshot::tree_only(tree.entries, meta.license_spdx.clone());
    let context = ReportContext {
        repo_meta: meta,
        branch,
        mode: AnalysisMode::Light,
        selected_files: Vec::new(),
        tree_truncated: tree.truncated,
    };
    Ok(finish(AnalysisReport::build(context, &snapshot), on_progress))
}

/// Fetch git history and reduce it into the statistics bundle.
pub async fn fetch_git_stats(
    client: &GitHubClient,
    repo: &RepoRef,
    on_progress: Option<&ProgressCallback>,
) -> Result<GitStatsBundle> {
    let data = client.fetch_git_stats_data(repo, on_progress).await?;
    Ok(GitStatsBundle::from_data(&data))
}
