//! Category analyzers.
//!
//! Each category is a pure function from a [`RepoSnapshot`] to a
//! [`CategoryResult`]. Signals carry fixed point values and are listed in a
//! fixed order per category; a category's score is the sum of the points of
//! its found signals, clamped to 100. Categories never look at each other's
//! results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::{RepoSnapshot, is_workflow};

mod ci;
mod community;
mod dependencies;
mod documentation;
mod license;
pub mod manifest;
mod openssf;
mod quality;
mod security;
pub mod techstack;

pub use license::{LicenseTier, classify_spdx};
pub use techstack::{TechItem, TechKind, detect_tech_stack};

/// The eight scoring dimensions, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Documentation,
    Security,
    Ci,
    Dependencies,
    Quality,
    License,
    Community,
    #[serde(rename = "openssf")]
    OpenSsf,
}

impl Category {
    /// Every category in registry order.
    pub const ALL: [Category; 8] = [
        Category::Documentation,
        Category::Security,
        Category::Ci,
        Category::Dependencies,
        Category::Quality,
        Category::License,
        Category::Community,
        Category::OpenSsf,
    ];

    /// Stable machine key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Category::Documentation => "documentation",
            Category::Security => "security",
            Category::Ci => "ci",
            Category::Dependencies => "dependencies",
            Category::Quality => "quality",
            Category::License => "license",
            Category::Community => "community",
            Category::OpenSsf => "openssf",
        }
    }

    /// Human readable name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Documentation => "Documentation",
            Category::Security => "Security",
            Category::Ci => "CI/CD",
            Category::Dependencies => "Dependencies",
            Category::Quality => "Code Quality",
            Category::License => "License",
            Category::Community => "Community",
            Category::OpenSsf => "OpenSSF",
        }
    }

    /// Look up a category by key (or by its label, case-insensitively).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.key() == key || c.label().eq_ignore_ascii_case(key))
    }

    /// Run this category's analyzer.
    #[must_use]
    pub fn analyze(self, snapshot: &RepoSnapshot) -> CategoryResult {
        let signals = match self {
            Category::Documentation => documentation::signals(snapshot),
            Category::Security => security::signals(snapshot),
            Category::Ci => ci::signals(snapshot),
            Category::Dependencies => dependencies::signals(snapshot),
            Category::Quality => quality::signals(snapshot),
            Category::License => license::signals(snapshot),
            Category::Community => community::signals(snapshot),
            Category::OpenSsf => openssf::signals(snapshot),
        };
        CategoryResult::from_signals(self, signals)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One piece of evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub found: bool,
    /// Points contributed to the category score when found.
    pub points: u8,
}

impl Signal {
    pub fn new(name: impl Into<String>, points: u8, found: bool) -> Self {
        Self {
            name: name.into(),
            found,
            points,
        }
    }
}

/// Score and evidence for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: Category,
    /// 0 to 100.
    pub score: u8,
    pub signals: Vec<Signal>,
}

impl CategoryResult {
    #[must_use]
    pub fn from_signals(category: Category, signals: Vec<Signal>) -> Self {
        let total: u32 = signals
            .iter()
            .filter(|s| s.found)
            .map(|s| u32::from(s.points))
            .sum();
        Self {
            category,
            score: total.min(100) as u8,
            signals,
        }
    }

    /// Missing signals, in registry order.
    pub fn missing(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| !s.found)
    }

    #[must_use]
    pub fn found_count(&self) -> usize {
        self.signals.iter().filter(|s| s.found).count()
    }

    #[must_use]
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }
}

/// Run all eight analyzers in registry order.
#[must_use]
pub fn analyze_all(snapshot: &RepoSnapshot) -> Vec<CategoryResult> {
    Category::ALL
        .into_iter()
        .map(|c| c.analyze(snapshot))
        .collect()
}

// Path registries shared by several categories.

pub(crate) const CONTRIBUTING_PATHS: &[&str] = &[
    "CONTRIBUTING.md",
    ".github/CONTRIBUTING.md",
    "docs/CONTRIBUTING.md",
    "CONTRIBUTING.rst",
    "CONTRIBUTING",
];

pub(crate) const SECURITY_POLICY_PATHS: &[&str] =
    &["SECURITY.md", ".github/SECURITY.md", "docs/SECURITY.md"];

pub(crate) const DEPENDABOT_PATHS: &[&str] =
    &[".github/dependabot.yml", ".github/dependabot.yaml"];

pub(crate) const RENOVATE_PATHS: &[&str] = &[
    "renovate.json",
    "renovate.json5",
    ".github/renovate.json",
    ".github/renovate.json5",
    ".renovaterc",
    ".renovaterc.json",
];

/// Lowercased texts of the fetched workflow files.
pub(crate) fn workflow_texts(snapshot: &RepoSnapshot) -> Vec<(String, String)> {
    snapshot
        .texts_matching(is_workflow)
        .map(|(path, text)| (path.to_string(), text.to_ascii_lowercase()))
        .collect()
}

/// Whether any fetched workflow triggers on pull requests.
pub(crate) fn has_pr_triggered_workflow(snapshot: &RepoSnapshot) -> bool {
    workflow_texts(snapshot)
        .iter()
        .any(|(_, text)| text.contains("pull_request"))
}

/// Whether any blob's final path component lowercases to one of `names`.
pub(crate) fn has_file_named(snapshot: &RepoSnapshot, names: &[&str]) -> bool {
    snapshot.any_blob(|p| {
        let name = crate::snapshot::file_name_lower(p);
        names.contains(&name.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::test_support::snapshot;

    #[test]
    fn registry_order_and_keys_are_stable() {
        let keys: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(
            keys,
            vec![
                "documentation",
                "security",
                "ci",
                "dependencies",
                "quality",
                "license",
                "community",
                "openssf"
            ]
        );
        assert_eq!(Category::from_key("openssf"), Some(Category::OpenSsf));
        assert_eq!(Category::from_key("CI/CD"), Some(Category::Ci));
        assert_eq!(Category::from_key("nope"), None);
    }

    #[test]
    fn score_is_sum_of_found_points_clamped() {
        let result = CategoryResult::from_signals(
            Category::Documentation,
            vec![
                Signal::new("a", 60, true),
                Signal::new("b", 30, false),
                Signal::new("c", 70, true),
            ],
        );
        assert_eq!(result.score, 100);
        assert_eq!(result.found_count(), 2);
        assert_eq!(result.missing().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn every_category_tops_out_at_exactly_one_hundred() {
        for category in Category::ALL {
            let result = category.analyze(&RepoSnapshot::default());
            let max: u32 = result.signals.iter().map(|s| u32::from(s.points)).sum();
            assert_eq!(max, 100, "{category}");
        }
    }

    #[test]
    fn analyzers_are_deterministic() {
        let snap = snapshot(
            &[
                "README.md",
                "package.json",
                "package-lock.json",
                ".github/workflows/ci.yml",
                "src/index.test.ts",
            ],
            &[
                ("README.md", "# Title\n\n## Usage\n\n```sh\nnpm i\n```\n"),
                ("package.json", r#"{"dependencies":{"react":"18"}}"#),
                (
                    ".github/workflows/ci.yml",
                    "on: [push, pull_request]\njobs:\n  test:\n    steps:\n      - run: npm test\n",
                ),
            ],
        );
        let first = analyze_all(&snap);
        for _ in 0..5 {
            assert_eq!(analyze_all(&snap), first);
        }
        assert_eq!(first.len(), 8);
        assert_eq!(
            first.iter().map(|r| r.category).collect::<Vec<_>>(),
            Category::ALL.to_vec()
        );
    }

    #[test]
    fn empty_repository_scores_low_but_does_not_fail() {
        let results = analyze_all(&RepoSnapshot::default());
        let doc = &results[0];
        assert_eq!(doc.score, 0);
        assert!(doc.signals.iter().all(|s| !s.found));
    }
}
