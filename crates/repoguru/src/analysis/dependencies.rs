use crate::snapshot::RepoSnapshot;

use super::Signal;
use super::manifest::{LOCKFILE_PATHS, MANIFEST_PATHS, parse_manifests};
use super::techstack::detect_tech_stack;

/// Dependency counts strictly below this are considered reasonable.
pub(crate) const MAX_REASONABLE_DEPENDENCIES: usize = 200;

pub(crate) fn signals(snapshot: &RepoSnapshot) -> Vec<Signal> {
    let manifests = parse_manifests(snapshot);
    let total: usize = manifests.iter().map(|m| m.dependencies.len()).sum();

    vec![
        Signal::new("Dependency manifest", 30, snapshot.has_any(MANIFEST_PATHS)),
        Signal::new("Lockfile present", 20, snapshot.has_any(LOCKFILE_PATHS)),
        Signal::new("Dependencies tracked", 15, total > 0),
        Signal::new(
            "Reasonable dependency count (<200)",
            20,
            !manifests.is_empty() && total < MAX_REASONABLE_DEPENDENCIES,
        ),
        Signal::new(
            "Tech stack detected",
            15,
            !detect_tech_stack(snapshot).is_empty(),
        ),
    ]
}
