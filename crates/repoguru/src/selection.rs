//! Choosing which files to download.
//!
//! A tree may hold thousands of paths but only [`MAX_SELECTED_FILES`] file
//! contents are fetched per analysis. Paths from a fixed registry
//! ([`EXACT_PATHS`]) win first, in registry order. Whatever budget remains
//! goes to pattern rules evaluated in a fixed order, each with its own cap.
//! The tree listing itself is never cut down; analyzers still see every path.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::snapshot::{TreeEntry, is_workflow};

/// Hard cap on content downloads per analysis.
pub const MAX_SELECTED_FILES: usize = 25;

/// Paths whose content is always fetched when present.
pub const EXACT_PATHS: &[&str] = &[
    // Documentation
    "README.md",
    "readme.md",
    "README.rst",
    "README",
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "COPYING",
    "SECURITY.md",
    ".github/SECURITY.md",
    "CONTRIBUTING.md",
    ".github/CONTRIBUTING.md",
    "CHANGELOG.md",
    "CODE_OF_CONDUCT.md",
    ".github/CODE_OF_CONDUCT.md",
    // Manifests
    "package.json",
    "Cargo.toml",
    "go.mod",
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "Pipfile",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "composer.json",
    // Lint, format and type configs
    "tsconfig.json",
    ".eslintrc.js",
    ".eslintrc.json",
    "eslint.config.js",
    "eslint.config.mjs",
    ".prettierrc",
    ".editorconfig",
    "rustfmt.toml",
    ".rustfmt.toml",
    "clippy.toml",
    ".flake8",
    "ruff.toml",
    ".golangci.yml",
    ".pre-commit-config.yaml",
    // Build and container files
    "Dockerfile",
    "docker-compose.yml",
    "Makefile",
    ".gitignore",
    // Ownership and dependency automation
    "CODEOWNERS",
    ".github/CODEOWNERS",
    ".github/dependabot.yml",
    ".github/dependabot.yaml",
    "renovate.json",
    // Community
    ".github/FUNDING.yml",
    "SUPPORT.md",
    ".github/SUPPORT.md",
    // Other CI systems
    ".gitlab-ci.yml",
    ".travis.yml",
    ".circleci/config.yml",
];

const MAX_WORKFLOWS: usize = 5;
const MAX_ISSUE_TEMPLATES: usize = 3;
const ISSUE_TEMPLATE_DIR: &str = ".github/ISSUE_TEMPLATE/";
const SCAN_TOOL_MARKER: &str = "codeql";
const PR_TEMPLATE_PATH: &str = ".github/PULL_REQUEST_TEMPLATE.md";

/// Which tier a selected file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Exact,
    Pattern,
}

/// A path chosen for content download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub path: String,
    pub tier: PriorityTier,
}

/// A pattern rule: a path predicate and an optional per-rule cap.
struct PatternRule {
    matches: fn(&str) -> bool,
    cap: Option<usize>,
}

fn is_issue_template(path: &str) -> bool {
    path.starts_with(ISSUE_TEMPLATE_DIR)
}

/// Case-sensitive, like the exact registry.
fn mentions_scan_tool(path: &str) -> bool {
    path.contains(SCAN_TOOL_MARKER)
}

fn is_pr_template(path: &str) -> bool {
    path == PR_TEMPLATE_PATH
}

const PATTERN_RULES: &[PatternRule] = &[
    PatternRule {
        matches: is_workflow,
        cap: Some(MAX_WORKFLOWS),
    },
    PatternRule {
        matches: is_issue_template,
        cap: Some(MAX_ISSUE_TEMPLATES),
    },
    PatternRule {
        matches: mentions_scan_tool,
        cap: None,
    },
    PatternRule {
        matches: is_pr_template,
        cap: Some(1),
    },
];

/// Pick the files to download from a tree listing.
///
/// Deterministic: the same tree always yields the same list. Only blobs are
/// selected and the result never exceeds [`MAX_SELECTED_FILES`].
#[must_use]
pub fn select_files(tree: &[TreeEntry]) -> Vec<SelectedFile> {
    let blobs: HashSet<&str> = tree
        .iter()
        .filter(|e| e.is_blob())
        .map(|e| e.path.as_str())
        .collect();

    let mut selected: Vec<SelectedFile> = EXACT_PATHS
        .iter()
        .filter(|p| blobs.contains(*p))
        .take(MAX_SELECTED_FILES)
        .map(|p| SelectedFile {
            path: (*p).to_string(),
            tier: PriorityTier::Exact,
        })
        .collect();
    let mut taken: HashSet<&str> = selected
        .iter()
        .filter_map(|s| blobs.get(s.path.as_str()).copied())
        .collect();

    let mut sorted_blobs: Vec<&str> = blobs.iter().copied().collect();
    sorted_blobs.sort_unstable();

    for rule in PATTERN_RULES {
        let budget = MAX_SELECTED_FILES.saturating_sub(selected.len());
        if budget == 0 {
            break;
        }
        let limit = rule.cap.map_or(budget, |cap| cap.min(budget));
        let picks: Vec<&str> = sorted_blobs
            .iter()
            .copied()
            .filter(|p| !taken.contains(p) && (rule.matches)(p))
            .take(limit)
            .collect();
        for path in picks {
            taken.insert(path);
            selected.push(SelectedFile {
                path: path.to_string(),
                tier: PriorityTier::Pattern,
            });
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs(paths: &[&str]) -> Vec<TreeEntry> {
        paths.iter().map(|p| TreeEntry::blob(*p)).collect()
    }

    fn paths(selected: &[SelectedFile]) -> Vec<&str> {
        selected.iter().map(|s| s.path.as_str()).collect()
    }

    #[test]
    fn empty_tree_selects_nothing() {
        assert!(select_files(&[]).is_empty());
    }

    #[test]
    fn exact_matches_follow_registry_order_not_tree_order() {
        let tree = blobs(&["Makefile", "package.json", "README.md", "src/main.ts"]);
        let selected = select_files(&tree);
        assert_eq!(paths(&selected), vec!["README.md", "package.json", "Makefile"]);
        assert!(selected.iter().all(|s| s.tier == PriorityTier::Exact));
    }

    #[test]
    fn exact_matching_is_case_sensitive() {
        let tree = blobs(&["Readme.MD", "LICENSE"]);
        assert_eq!(paths(&select_files(&tree)), vec!["LICENSE"]);
    }

    #[test]
    fn directories_are_never_selected() {
        let tree = vec![
            TreeEntry::dir("README.md"),
            TreeEntry::dir(".github/workflows/ci.yml"),
            TreeEntry::blob("LICENSE"),
        ];
        assert_eq!(paths(&select_files(&tree)), vec!["LICENSE"]);
    }

    #[test]
    fn workflows_are_capped_at_five_and_sorted() {
        let mut tree: Vec<TreeEntry> = (0..12)
            .rev()
            .map(|i| TreeEntry::blob(format!(".github/workflows/w{i:02}.yml")))
            .collect();
        tree.push(TreeEntry::blob("README.md"));
        let selected = select_files(&tree);
        assert_eq!(
            paths(&selected),
            vec![
                "README.md",
                ".github/workflows/w00.yml",
                ".github/workflows/w01.yml",
                ".github/workflows/w02.yml",
                ".github/workflows/w03.yml",
                ".github/workflows/w04.yml",
            ]
        );
    }

    #[test]
    fn scan_tool_marker_is_case_sensitive() {
        let tree = blobs(&["tools/CodeQL/setup.yml", "tools/codeql/setup.yml"]);
        assert_eq!(paths(&select_files(&tree)), vec!["tools/codeql/setup.yml"]);
    }

    #[test]
    fn pattern_rules_apply_in_priority_order() {
        let tree = blobs(&[
            ".github/PULL_REQUEST_TEMPLATE.md",
            ".github/codeql/codeql-config.yml",
            ".github/ISSUE_TEMPLATE/bug.md",
            ".github/ISSUE_TEMPLATE/feature.md",
            ".github/ISSUE_TEMPLATE/question.md",
            ".github/ISSUE_TEMPLATE/config.yml",
            ".github/workflows/codeql.yml",
            ".github/workflows/ci.yml",
        ]);
        let selected = select_files(&tree);
        assert_eq!(
            paths(&selected),
            vec![
                ".github/workflows/ci.yml",
                ".github/workflows/codeql.yml",
                ".github/ISSUE_TEMPLATE/bug.md",
                ".github/ISSUE_TEMPLATE/config.yml",
                ".github/ISSUE_TEMPLATE/feature.md",
                ".github/codeql/codeql-config.yml",
                ".github/PULL_REQUEST_TEMPLATE.md",
            ]
        );
        assert!(selected.iter().all(|s| s.tier == PriorityTier::Pattern));
    }

    #[test]
    fn never_exceeds_cap_and_exact_entries_win() {
        let mut tree: Vec<TreeEntry> = (0..40)
            .map(|i| TreeEntry::blob(format!("pkg/codeql-{i}.ql")))
            .collect();
        tree.extend(EXACT_PATHS.iter().map(|p| TreeEntry::blob(*p)));

        let selected = select_files(&tree);
        assert_eq!(selected.len(), MAX_SELECTED_FILES);
        assert_eq!(
            paths(&selected),
            EXACT_PATHS[..MAX_SELECTED_FILES].to_vec()
        );
    }

    #[test]
    fn remaining_budget_is_filled_by_patterns() {
        let mut tree: Vec<TreeEntry> = EXACT_PATHS[..20]
            .iter()
            .map(|p| TreeEntry::blob(*p))
            .collect();
        tree.extend((0..10).map(|i| TreeEntry::blob(format!("tools/codeql/{i}.ql"))));

        let selected = select_files(&tree);
        assert_eq!(selected.len(), 25);
        assert_eq!(
            selected
                .iter()
                .filter(|s| s.tier == PriorityTier::Pattern)
                .count(),
            5
        );
    }

    #[test]
    fn every_selected_path_is_a_blob_of_the_tree_and_unique() {
        let mut tree = blobs(&[
            "README.md",
            ".github/workflows/codeql-analysis.yml",
            ".github/ISSUE_TEMPLATE/bug.yml",
        ]);
        tree.push(TreeEntry::dir(".github/codeql"));
        for _ in 0..3 {
            let selected = select_files(&tree);
            let unique: HashSet<&str> = selected.iter().map(|s| s.path.as_str()).collect();
            assert_eq!(unique.len(), selected.len());
            for s in &selected {
                assert!(tree.iter().any(|e| e.is_blob() && e.path == s.path));
            }
            assert_eq!(selected, select_files(&tree));
        }
    }
}
