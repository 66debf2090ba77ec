//! Supply-chain checks modelled on the OpenSSF Scorecard.
//!
//! Workflow-based checks only see the workflow files that were fetched; a
//! check that needs at least one workflow to inspect is not satisfied by an
//! empty set.

use crate::snapshot::{RepoSnapshot, file_name_lower};

use super::license::LICENSE_PATHS;
use super::{DEPENDABOT_PATHS, RENOVATE_PATHS, SECURITY_POLICY_PATHS, Signal, workflow_texts};

const BINARY_EXTENSIONS: &[&str] = &[
    ".exe", ".dll", ".so", ".dylib", ".jar", ".war", ".class", ".pyc", ".o", ".a", ".lib", ".bin",
];

const PROVENANCE_MARKERS: &[&str] = &[
    "slsa",
    "sigstore",
    "cosign",
    "attest-build-provenance",
    "actions/attest",
];

const SBOM_MARKERS: &[&str] = &["sbom", "cyclonedx", "spdx", "syft"];

/// Expressions attacker-controlled in `pull_request_target` and issue events.
const INJECTABLE_CONTEXTS: &[&str] = &[
    "${{ github.event.issue.title",
    "${{ github.event.issue.body",
    "${{ github.event.pull_request.title",
    "${{ github.event.pull_request.body",
    "${{ github.event.comment.body",
    "${{ github.event.review.body",
    "${{ github.event.head_commit.message",
    "${{ github.head_ref",
];

fn all_workflows_declare_permissions(workflows: &[(String, String)]) -> bool {
    !workflows.is_empty()
        && workflows
            .iter()
            .all(|(_, text)| text.lines().any(|l| l.trim_start().starts_with("permissions:")))
}

/// The action references after each `uses:` key, skipping local and docker refs.
fn action_refs(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter_map(|line| {
        let rest = line.trim_start().trim_start_matches("- ").trim_start();
        let value = rest.strip_prefix("uses:")?.trim();
        let value = value.trim_matches(|c| c == '"' || c == '\'');
        let value = value.split('#').next().unwrap_or(value).trim();
        if value.is_empty() || value.starts_with("./") || value.starts_with("docker://") {
            None
        } else {
            Some(value)
        }
    })
}

fn is_pinned(reference: &str) -> bool {
    reference
        .rsplit_once('@')
        .is_some_and(|(_, rev)| rev.len() == 40 && rev.chars().all(|c| c.is_ascii_hexdigit()))
}

fn all_actions_pinned(workflows: &[(String, String)]) -> bool {
    let mut refs = workflows.iter().flat_map(|(_, text)| action_refs(text)).peekable();
    refs.peek().is_some() && refs.all(is_pinned)
}

fn has_dangerous_workflow(workflows: &[(String, String)]) -> bool {
    workflows.iter().any(|(_, text)| {
        let checks_out_untrusted = text.contains("pull_request_target")
            && text.contains("github.event.pull_request.head");
        let injects = INJECTABLE_CONTEXTS
            .iter()
            .any(|ctx| text.lines().any(|l| l.contains("run:") && l.contains(ctx)));
        checks_out_untrusted || injects
    })
}

fn is_binary_artifact(path: &str) -> bool {
    let name = file_name_lower(path);
    BINARY_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn mentions_any(workflows: &[(String, String)], markers: &[&str]) -> bool {
    workflows
        .iter()
        .any(|(_, text)| markers.iter().any(|m| text.contains(m)))
}

pub(crate) fn signals(snapshot: &RepoSnapshot) -> Vec<Signal> {
    let workflows = workflow_texts(snapshot);

    let sbom = mentions_any(&workflows, SBOM_MARKERS)
        || snapshot.any_blob(|p| {
            let name = file_name_lower(p);
            name.contains("sbom") || name.ends_with(".cdx.json") || name.ends_with(".spdx.json")
        });
    let license = snapshot.license_spdx.is_some() || snapshot.has_any(LICENSE_PATHS);

    vec![
        Signal::new(
            "Token permissions",
            10,
            all_workflows_declare_permissions(&workflows),
        ),
        Signal::new("Pinned dependencies", 10, all_actions_pinned(&workflows)),
        Signal::new(
            "No dangerous workflows",
            10,
            !has_dangerous_workflow(&workflows),
        ),
        Signal::new("No binary artifacts", 10, !snapshot.any_blob(is_binary_artifact)),
        Signal::new(
            "Signed releases / SLSA",
            10,
            mentions_any(&workflows, PROVENANCE_MARKERS),
        ),
        Signal::new(
            "Fuzzing",
            10,
            snapshot.any_blob(|p| p.to_ascii_lowercase().contains("fuzz")),
        ),
        Signal::new("SBOM generation", 10, sbom),
        Signal::new(
            "Dependency update tool",
            10,
            snapshot.has_any(DEPENDABOT_PATHS) || snapshot.has_any(RENOVATE_PATHS),
        ),
        Signal::new("Security policy", 10, snapshot.has_any(SECURITY_POLICY_PATHS)),
        Signal::new("License", 10, license),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Category, CategoryResult};
    use crate::snapshot::test_support::snapshot;

    const PINNED: &str = "\
permissions:
  contents: read
jobs:
  build:
    steps:
      - uses: actions/checkout@b4ffde65f46336ab88eb53be808477a3936bae11 # v4
      - uses: ./local-action
      - uses: sigstore/cosign-installer@59acb6260d9c0ba8f4a2f9d9b48431a222b68e20
      - run: syft . -o cyclonedx-json
";

    fn analyze(snap: &RepoSnapshot) -> CategoryResult {
        CategoryResult::from_signals(Category::OpenSsf, signals(snap))
    }

    #[test]
    fn empty_repository_only_passes_negative_checks() {
        let result = analyze(&RepoSnapshot::default());
        assert_eq!(result.score, 20);
        assert!(result.signal("No dangerous workflows").is_some_and(|s| s.found));
        assert!(result.signal("No binary artifacts").is_some_and(|s| s.found));
    }

    #[test]
    fn pinning_requires_full_commit_shas() {
        assert!(is_pinned("actions/checkout@b4ffde65f46336ab88eb53be808477a3936bae11"));
        assert!(!is_pinned("actions/checkout@v4"));
        assert!(!is_pinned("actions/checkout"));

        let refs: Vec<&str> = action_refs(PINNED).collect();
        assert_eq!(refs.len(), 2);
        assert!(all_actions_pinned(&[("w".into(), PINNED.into())]));

        let unpinned = "steps:\n  - uses: actions/checkout@v4\n";
        assert!(!all_actions_pinned(&[("w".into(), unpinned.into())]));
        assert!(!all_actions_pinned(&[]));
    }

    #[test]
    fn pull_request_target_with_head_checkout_is_dangerous() {
        let text = "on: pull_request_target\nsteps:\n  - uses: actions/checkout@v4\n    with:\n      ref: ${{ github.event.pull_request.head.sha }}\n";
        assert!(has_dangerous_workflow(&[("w".into(), text.into())]));

        let injection = "on: issues\nsteps:\n  - run: echo \"${{ github.event.issue.title }}\"\n";
        assert!(has_dangerous_workflow(&[("w".into(), injection.into())]));

        let safe = "on: pull_request\nsteps:\n  - run: echo hi\n";
        assert!(!has_dangerous_workflow(&[("w".into(), safe.into())]));
    }

    #[test]
    fn committed_binaries_are_flagged() {
        let result = analyze(&snapshot(&["lib/native.dll"], &[]));
        assert!(result.signal("No binary artifacts").is_some_and(|s| !s.found));
    }

    #[test]
    fn hardened_repository_scores_one_hundred() {
        let mut snap = snapshot(
            &[
                ".github/workflows/release.yml",
                "fuzz/fuzz_targets/parse.rs",
                ".github/dependabot.yml",
                "SECURITY.md",
                "LICENSE",
            ],
            &[(".github/workflows/release.yml", PINNED)],
        );
        snap.license_spdx = Some("MIT".into());
        assert_eq!(analyze(&snap).score, 100);
    }
}
