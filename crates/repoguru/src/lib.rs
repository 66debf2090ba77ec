//! Repo Guru - engineering-health scoring for GitHub repositories.
//!
//! Given a repository reference, this library fetches its metadata, recursive
//! tree and a bounded set of high-signal files, scores eight categories
//! (documentation, security, CI/CD, dependencies, code quality, license,
//! community, OpenSSF) and aggregates them into a weighted grade with
//! strengths, risks and next steps. Optionally it also reduces commit
//! history and repository statistics into a [`GitStatsBundle`].
//!
//! # Example
//!
//! ```ignore
//! use repoguru::{GitHubClient, RepoRef, analyze_repo};
//!
//! let client = GitHubClient::new(Some(&token))?;
//! let repo = RepoRef::parse("https://github.com/rust-lang/cargo")?;
//! let report = analyze_repo(&client, &repo, None).await?;
//! println!("{} {}", report.grade, report.overall_score);
//! ```

pub mod analysis;
pub mod git_stats;
pub mod github;
pub mod http;
pub mod oauth;
pub mod pacing;
pub mod pipeline;
pub mod policy;
pub mod progress;
pub mod rate_limit;
pub mod repo_ref;
pub mod report;
pub mod scan;
pub mod scoring;
pub mod selection;
pub mod snapshot;

pub use analysis::{Category, CategoryResult, Signal, TechItem, TechKind, analyze_all};
pub use git_stats::GitStatsBundle;
pub use github::{GitHubClient, GitHubError};
pub use pipeline::{analyze_light, analyze_repo, fetch_git_stats};
pub use policy::{Policy, PolicyResult, evaluate};
pub use progress::{AnalysisProgress, ProgressCallback};
pub use repo_ref::RepoRef;
pub use report::{AnalysisMode, AnalysisReport};
pub use scan::{ScanReport, scan_org, scan_user};
pub use scoring::{Aggregate, NextStep, aggregate, grade};
pub use selection::{SelectedFile, select_files};
pub use snapshot::{FileContent, RepoMeta, RepoSnapshot, TreeEntry};
