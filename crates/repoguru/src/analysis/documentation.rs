use crate::snapshot::RepoSnapshot;

use super::{CONTRIBUTING_PATHS, Signal};

const SUBSTANTIAL_README_CHARS: usize = 500;
const MIN_README_SECTIONS: usize = 3;

const CHANGELOG_PATHS: &[&str] = &[
    "CHANGELOG.md",
    "CHANGELOG",
    "CHANGELOG.rst",
    "CHANGES.md",
    "CHANGES",
    "HISTORY.md",
    "RELEASES.md",
];

fn is_root_readme(path: &str) -> bool {
    !path.contains('/') && path.to_ascii_lowercase().starts_with("readme")
}

fn section_count(readme: &str) -> usize {
    readme
        .lines()
        .filter(|line| line.trim_start().starts_with('#'))
        .count()
}

pub(crate) fn signals(snapshot: &RepoSnapshot) -> Vec<Signal> {
    let readme = snapshot.texts_matching(is_root_readme).next().map(|(_, t)| t);
    let readme_text = readme.as_deref().unwrap_or_default();

    vec![
        Signal::new("README exists", 25, snapshot.any_blob(is_root_readme)),
        Signal::new(
            "Substantial README (>500 chars)",
            15,
            readme_text.chars().count() > SUBSTANTIAL_README_CHARS,
        ),
        Signal::new(
            "README has sections",
            15,
            section_count(readme_text) >= MIN_README_SECTIONS,
        ),
        Signal::new("Code examples in README", 10, readme_text.contains("```")),
        Signal::new("CONTRIBUTING guide", 15, snapshot.has_any(CONTRIBUTING_PATHS)),
        Signal::new("Changelog", 10, snapshot.has_any(CHANGELOG_PATHS)),
        Signal::new(
            "Documentation directory",
            10,
            snapshot.has_dir("docs") || snapshot.has_dir("doc"),
        ),
    ]
}
