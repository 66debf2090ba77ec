//! Immutable inputs of one analysis run.
//!
//! A [`RepoSnapshot`] is what the analyzers see: the full tree listing, the
//! contents of the files that were selected and fetched, and the bit of
//! repository metadata the license category needs.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::types::GitHubRepo;

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
}

/// One path of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
            size: None,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
            size: None,
        }
    }

    #[must_use]
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }
}

/// A recursive tree listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
    /// GitHub stopped listing early. Analysis proceeds on what was returned.
    pub truncated: bool,
}

/// Outcome of downloading one selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Decoded bytes.
    Bytes(Vec<u8>),
    /// The response arrived but its payload could not be decoded.
    DecodeFailed,
    /// The request failed; the file counts as not found.
    Missing,
}

/// Repository metadata used in reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMeta {
    pub full_name: String,
    pub description: Option<String>,
    pub default_branch: String,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub language: Option<String>,
    /// SPDX identifier; `NOASSERTION` is stored as `None`.
    pub license_spdx: Option<String>,
    pub topics: Vec<String>,
    pub archived: bool,
    pub fork: bool,
    pub size_kb: u64,
    pub pushed_at: Option<DateTime<Utc>>,
}

impl From<GitHubRepo> for RepoMeta {
    fn from(repo: GitHubRepo) -> Self {
        let license_spdx = repo
            .license
            .and_then(|l| l.spdx_id)
            .filter(|id| !id.is_empty() && id != "NOASSERTION");
        Self {
            full_name: repo.full_name,
            description: repo.description,
            default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            open_issues: repo.open_issues_count,
            language: repo.language,
            license_spdx,
            topics: repo.topics,
            archived: repo.archived,
            fork: repo.fork,
            size_kb: repo.size,
            pushed_at: repo.pushed_at,
        }
    }
}

/// Everything an analyzer may look at.
#[derive(Debug, Clone, Default)]
pub struct RepoSnapshot {
    pub tree: Vec<TreeEntry>,
    /// Successfully fetched file contents keyed by path.
    pub files: BTreeMap<String, Vec<u8>>,
    /// SPDX identifier GitHub detected for the repository.
    pub license_spdx: Option<String>,
}

impl RepoSnapshot {
    /// Build a snapshot, dropping files that failed to fetch or decode.
    pub fn new(
        tree: Vec<TreeEntry>,
        contents: impl IntoIterator<Item = (String, FileContent)>,
        license_spdx: Option<String>,
    ) -> Self {
        let files = contents
            .into_iter()
            .filter_map(|(path, content)| match content {
                FileContent::Bytes(bytes) => Some((path, bytes)),
                FileContent::DecodeFailed | FileContent::Missing => None,
            })
            .collect();
        Self {
            tree,
            files,
            license_spdx,
        }
    }

    /// Tree-only snapshot, used by light analysis.
    pub fn tree_only(tree: Vec<TreeEntry>, license_spdx: Option<String>) -> Self {
        Self {
            tree,
            files: BTreeMap::new(),
            license_spdx,
        }
    }

    /// Whether a blob exists at exactly `path`.
    #[must_use]
    pub fn has_file(&self, path: &str) -> bool {
        self.tree.iter().any(|e| e.is_blob() && e.path == path)
    }

    /// Whether any of `paths` exists as a blob.
    #[must_use]
    pub fn has_any(&self, paths: &[&str]) -> bool {
        paths.iter().any(|p| self.has_file(p))
    }

    /// First of `paths` that exists as a blob.
    #[must_use]
    pub fn first_existing<'a>(&self, paths: &[&'a str]) -> Option<&'a str> {
        paths.iter().copied().find(|p| self.has_file(p))
    }

    /// Whether a directory exists at `path` (explicit tree entry or implied by a child path).
    #[must_use]
    pub fn has_dir(&self, path: &str) -> bool {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.tree.iter().any(|e| {
            (e.kind == EntryKind::Tree && e.path == path) || e.path.starts_with(&prefix)
        })
    }

    /// Blob paths matching a predicate.
    pub fn blobs_matching<'a>(
        &'a self,
        mut pred: impl FnMut(&str) -> bool + 'a,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.tree
            .iter()
            .filter(|e| e.is_blob())
            .map(|e| e.path.as_str())
            .filter(move |p| pred(*p))
    }

    /// Whether any blob path matches the predicate.
    #[must_use]
    pub fn any_blob(&self, mut pred: impl FnMut(&str) -> bool) -> bool {
        self.tree.iter().any(|e| e.is_blob() && pred(&e.path))
    }

    /// Text of a fetched file, decoded lossily.
    #[must_use]
    pub fn text(&self, path: &str) -> Option<Cow<'_, str>> {
        self.files.get(path).map(|b| String::from_utf8_lossy(b))
    }

    /// Text of the first fetched file among `paths`.
    #[must_use]
    pub fn first_text(&self, paths: &[&str]) -> Option<Cow<'_, str>> {
        paths.iter().find_map(|p| self.text(p))
    }

    /// Texts of all fetched files whose path matches the predicate.
    pub fn texts_matching<'a>(
        &'a self,
        mut pred: impl FnMut(&str) -> bool + 'a,
    ) -> impl Iterator<Item = (&'a str, Cow<'a, str>)> + 'a {
        self.files
            .iter()
            .filter(move |(p, _)| pred(p.as_str()))
            .map(|(p, b)| (p.as_str(), String::from_utf8_lossy(b)))
    }
}

/// Whether `path` is a GitHub Actions workflow file.
#[must_use]
pub fn is_workflow(path: &str) -> bool {
    path.starts_with(".github/workflows/") && (path.ends_with(".yml") || path.ends_with(".yaml"))
}

/// Lowercased final path component.
#[must_use]
pub fn file_name_lower(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Snapshot from blob paths and `(path, text)` contents.
    pub fn snapshot(paths: &[&str], files: &[(&str, &str)]) -> RepoSnapshot {
        let tree = paths.iter().map(|p| TreeEntry::blob(*p)).collect();
        let contents = files
            .iter()
            .map(|(p, t)| (p.to_string(), FileContent::Bytes(t.as_bytes().to_vec())));
        RepoSnapshot::new(tree, contents, None)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::snapshot;
    use super::*;
    use crate::github::types::{GitHubLicense, UserRef};

    #[test]
    fn snapshot_drops_failed_contents() {
        let snap = RepoSnapshot::new(
            vec![TreeEntry::blob("a"), TreeEntry::blob("b"), TreeEntry::blob("c")],
            vec![
                ("a".to_string(), FileContent::Bytes(b"hi".to_vec())),
                ("b".to_string(), FileContent::DecodeFailed),
                ("c".to_string(), FileContent::Missing),
            ],
            None,
        );
        assert_eq!(snap.text("a").as_deref(), Some("hi"));
        assert!(snap.text("b").is_none());
        assert!(snap.text("c").is_none());
        assert!(snap.has_file("b"));
    }

    #[test]
    fn has_dir_accepts_implied_directories() {
        let snap = snapshot(&["docs/guide/intro.md"], &[]);
        assert!(snap.has_dir("docs"));
        assert!(snap.has_dir("docs/guide"));
        assert!(!snap.has_dir("doc"));
        assert!(!snap.has_file("docs"));
    }

    #[test]
    fn directory_entries_are_not_files() {
        let snap = RepoSnapshot::tree_only(vec![TreeEntry::dir("README.md")], None);
        assert!(!snap.has_file("README.md"));
        assert!(snap.has_dir("README.md"));
    }

    #[test]
    fn workflow_detection_requires_yaml_under_workflows() {
        assert!(is_workflow(".github/workflows/ci.yml"));
        assert!(is_workflow(".github/workflows/release.yaml"));
        assert!(!is_workflow(".github/workflows/README.md"));
        assert!(!is_workflow("workflows/ci.yml"));
    }

    #[test]
    fn repo_meta_treats_noassertion_as_absent() {
        let repo = GitHubRepo {
            name: "r".into(),
            full_name: "o/r".into(),
            owner: UserRef { login: "o".into() },
            description: None,
            default_branch: Some("trunk".into()),
            stargazers_count: 1,
            forks_count: 0,
            open_issues_count: 0,
            language: None,
            license: Some(GitHubLicense {
                spdx_id: Some("NOASSERTION".into()),
                name: Some("Other".into()),
            }),
            topics: vec![],
            archived: false,
            fork: false,
            size: 10,
            pushed_at: None,
        };
        let meta = RepoMeta::from(repo);
        assert_eq!(meta.license_spdx, None);
        assert_eq!(meta.default_branch, "trunk");
    }
}
