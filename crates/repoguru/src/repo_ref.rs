//! Repository references as typed by users.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::github::GitHubError;

/// Identifies the repository (and optionally the branch) to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    /// `None` means the repository's default branch.
    pub branch: Option<String>,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: None,
        }
    }

    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// `owner/repo`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Parse `owner/repo`, a GitHub URL, or a URL with a `/tree/<branch>` segment.
    ///
    /// Branch names may contain slashes (`/tree/release/1.x`).
    pub fn parse(input: &str) -> Result<Self, GitHubError> {
        let invalid = || GitHubError::InvalidRepoRef(input.to_string());

        let mut rest = input.trim();
        if let Some(idx) = rest.find(['?', '#']) {
            rest = &rest[..idx];
        }

        let mut is_url = false;
        for scheme in ["https://", "http://"] {
            if let Some(stripped) = rest.strip_prefix(scheme) {
                rest = stripped;
                is_url = true;
            }
        }
        rest = rest.strip_prefix("www.").unwrap_or(rest);
        if let Some(stripped) = rest.strip_prefix("github.com/") {
            rest = stripped;
            is_url = true;
        } else if is_url {
            return Err(invalid());
        }

        let segments: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
        let (owner, repo, branch) = match segments.as_slice() {
            [owner, repo] => (*owner, *repo, None),
            [owner, repo, "tree", branch @ ..] if is_url && !branch.is_empty() => {
                if branch.iter().any(|s| s.is_empty()) {
                    return Err(invalid());
                }
                (*owner, *repo, Some(branch.join("/")))
            }
            _ => return Err(invalid()),
        };

        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if !is_valid_name(owner) || !is_valid_name(repo) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch,
        })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl FromStr for RepoRef {
    type Err = GitHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        if let Some(branch) = &self.branch {
            write!(f, "@{branch}")?;
        }
        Ok(())
    }
}
