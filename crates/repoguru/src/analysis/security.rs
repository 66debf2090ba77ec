use crate::snapshot::{RepoSnapshot, file_name_lower};

use super::{
    DEPENDABOT_PATHS, SECURITY_POLICY_PATHS, Signal, has_pr_triggered_workflow, workflow_texts,
};

const CODEOWNERS_PATHS: &[&str] = &["CODEOWNERS", ".github/CODEOWNERS", "docs/CODEOWNERS"];

/// Substrings in workflow text that indicate a security scanner.
const SCANNER_MARKERS: &[&str] = &["codeql-action", "snyk", "trivy", "semgrep", "gitleaks"];

const SECRET_FILE_NAMES: &[&str] = &[
    ".env",
    ".env.local",
    ".env.production",
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
    "credentials.json",
    ".npmrc",
    ".pypirc",
];

const SECRET_EXTENSIONS: &[&str] = &[".pem", ".key", ".p12", ".pfx"];

fn is_secret_file(path: &str) -> bool {
    let name = file_name_lower(path);
    SECRET_FILE_NAMES.contains(&name.as_str())
        || SECRET_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn has_security_scanning(snapshot: &RepoSnapshot) -> bool {
    snapshot.any_blob(|p| p.to_ascii_lowercase().contains("codeql"))
        || workflow_texts(snapshot)
            .iter()
            .any(|(_, text)| SCANNER_MARKERS.iter().any(|m| text.contains(m)))
}

pub(crate) fn signals(snapshot: &RepoSnapshot) -> Vec<Signal> {
    vec![
        Signal::new("Security policy", 20, snapshot.has_any(SECURITY_POLICY_PATHS)),
        Signal::new("CODEOWNERS file", 15, snapshot.has_any(CODEOWNERS_PATHS)),
        Signal::new("Dependabot configured", 15, snapshot.has_any(DEPENDABOT_PATHS)),
        Signal::new("Security scanning", 15, has_security_scanning(snapshot)),
        Signal::new("PR-triggered workflows", 10, has_pr_triggered_workflow(snapshot)),
        Signal::new(".gitignore present", 10, snapshot.has_file(".gitignore")),
        Signal::new("No exposed secret files", 15, !snapshot.any_blob(is_secret_file)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Category, CategoryResult};
    use crate::snapshot::test_support::snapshot;

    fn analyze(snap: &RepoSnapshot) -> CategoryResult {
        CategoryResult::from_signals(Category::Security, signals(snap))
    }

    #[test]
    fn empty_repository_only_earns_no_secrets() {
        assert_eq!(analyze(&RepoSnapshot::default()).score, 15);
    }

    #[test]
    fn committed_env_file_is_flagged() {
        let result = analyze(&snapshot(&["config/.env", ".env.example"], &[]));
        assert!(
            result
                .signal("No exposed secret files")
                .is_some_and(|s| !s.found)
        );
    }

    #[test]
    fn env_example_is_not_a_secret() {
        assert!(!is_secret_file(".env.example"));
        assert!(is_secret_file("deploy/server.pem"));
        assert!(is_secret_file("ID_RSA"));
    }

    #[test]
    fn codeql_workflow_counts_as_scanning() {
        let snap = snapshot(
            &[".github/workflows/analysis.yml"],
            &[(
                ".github/workflows/analysis.yml",
                "on: [pull_request]\njobs:\n  a:\n    steps:\n      - uses: github/codeql-action/init@v3\n",
            )],
        );
        let result = analyze(&snap);
        assert!(result.signal("Security scanning").is_some_and(|s| s.found));
        assert!(result.signal("PR-triggered workflows").is_some_and(|s| s.found));
    }

    #[test]
    fn well_secured_repository_scores_one_hundred() {
        let snap = snapshot(
            &[
                "SECURITY.md",
                ".github/CODEOWNERS",
                ".github/dependabot.yml",
                ".github/workflows/codeql.yml",
                ".gitignore",
            ],
            &[(".github/workflows/codeql.yml", "on:\n  pull_request:\n")],
        );
        assert_eq!(analyze(&snap).score, 100);
    }
}
