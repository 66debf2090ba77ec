use crate::snapshot::RepoSnapshot;

use super::{CONTRIBUTING_PATHS, Signal};

const ISSUE_TEMPLATE_FILES: &[&str] = &[".github/ISSUE_TEMPLATE.md", "ISSUE_TEMPLATE.md"];

const PR_TEMPLATE_PATHS: &[&str] = &[
    ".github/PULL_REQUEST_TEMPLATE.md",
    ".github/pull_request_template.md",
    "PULL_REQUEST_TEMPLATE.md",
    "docs/PULL_REQUEST_TEMPLATE.md",
];

const CODE_OF_CONDUCT_PATHS: &[&str] = &[
    "CODE_OF_CONDUCT.md",
    ".github/CODE_OF_CONDUCT.md",
    "docs/CODE_OF_CONDUCT.md",
];

const FUNDING_PATHS: &[&str] = &[".github/FUNDING.yml", ".github/FUNDING.yaml", "FUNDING.yml"];

const SUPPORT_PATHS: &[&str] = &["SUPPORT.md", ".github/SUPPORT.md", "docs/SUPPORT.md"];

pub(crate) fn signals(snapshot: &RepoSnapshot) -> Vec<Signal> {
    let issue_templates =
        snapshot.has_dir(".github/ISSUE_TEMPLATE") || snapshot.has_any(ISSUE_TEMPLATE_FILES);
    let pr_template =
        snapshot.has_any(PR_TEMPLATE_PATHS) || snapshot.has_dir(".github/PULL_REQUEST_TEMPLATE");

    vec![
        Signal::new("Issue templates", 20, issue_templates),
        Signal::new("PR template", 20, pr_template),
        Signal::new("Code of Conduct", 20, snapshot.has_any(CODE_OF_CONDUCT_PATHS)),
        Signal::new("CONTRIBUTING guide", 15, snapshot.has_any(CONTRIBUTING_PATHS)),
        Signal::new("Funding configuration", 10, snapshot.has_any(FUNDING_PATHS)),
        Signal::new("Support resources", 15, snapshot.has_any(SUPPORT_PATHS)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Category, CategoryResult};
    use crate::snapshot::test_support::snapshot;

    fn analyze(snap: &RepoSnapshot) -> CategoryResult {
        CategoryResult::from_signals(Category::Community, signals(snap))
    }

    #[test]
    fn issue_template_directory_counts() {
        let result = analyze(&snapshot(&[".github/ISSUE_TEMPLATE/bug_report.yml"], &[]));
        assert_eq!(result.score, 20);
    }

    #[test]
    fn welcoming_repository_scores_one_hundred() {
        let snap = snapshot(
            &[
                ".github/ISSUE_TEMPLATE/bug.md",
                ".github/pull_request_template.md",
                "CODE_OF_CONDUCT.md",
                ".github/CONTRIBUTING.md",
                ".github/FUNDING.yml",
                "SUPPORT.md",
            ],
            &[],
        );
        assert_eq!(analyze(&snap).score, 100);
    }

    #[test]
    fn missing_signals_keep_registry_order() {
        let result = analyze(&snapshot(&["CODE_OF_CONDUCT.md"], &[]));
        let missing: Vec<&str> = result.missing().map(|s| s.name.as_str()).collect();
        assert_eq!(
            missing,
            vec![
                "Issue templates",
                "PR template",
                "CONTRIBUTING guide",
                "Funding configuration",
                "Support resources"
            ]
        );
    }
}
