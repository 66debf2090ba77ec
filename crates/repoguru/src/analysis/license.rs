//! License presence and classification.
//!
//! GitHub's detected SPDX identifier is preferred. When GitHub could not
//! classify the license, the LICENSE text itself is matched against a few
//! well known headings.

use serde::{Deserialize, Serialize};

use crate::snapshot::RepoSnapshot;

use super::Signal;

pub(crate) const LICENSE_PATHS: &[&str] = &[
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "LICENCE",
    "LICENCE.md",
    "COPYING",
    "COPYING.md",
    "LICENSE-MIT",
    "LICENSE-APACHE",
];

/// How permissive a license is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    Permissive,
    Copyleft,
    None,
}

const PERMISSIVE_PREFIXES: &[&str] = &[
    "MIT", "APACHE-", "BSD-", "ISC", "0BSD", "UNLICENSE", "ZLIB", "BSL-1.0", "CC0-", "WTFPL",
    "PSF-", "PYTHON-",
];

const COPYLEFT_PREFIXES: &[&str] = &[
    "GPL-", "AGPL-", "LGPL-", "MPL-", "EPL-", "EUPL-", "CDDL-", "OSL-", "CECILL",
];

/// Classify an SPDX identifier (or expression) into a tier.
///
/// For `OR` expressions the most permissive alternative wins; for `AND` the
/// most restrictive component decides.
#[must_use]
pub fn classify_spdx(spdx: &str) -> LicenseTier {
    let id = spdx.trim().trim_matches(|c| c == '(' || c == ')');
    if let Some((left, right)) = id.split_once(" OR ") {
        return most_permissive(classify_spdx(left), classify_spdx(right));
    }
    if let Some((left, right)) = id.split_once(" AND ") {
        return least_permissive(classify_spdx(left), classify_spdx(right));
    }

    let upper = id.to_ascii_uppercase();
    if COPYLEFT_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        LicenseTier::Copyleft
    } else if PERMISSIVE_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        LicenseTier::Permissive
    } else {
        LicenseTier::None
    }
}

fn rank(tier: LicenseTier) -> u8 {
    match tier {
        LicenseTier::Permissive => 2,
        LicenseTier::Copyleft => 1,
        LicenseTier::None => 0,
    }
}

fn most_permissive(a: LicenseTier, b: LicenseTier) -> LicenseTier {
    if rank(a) >= rank(b) { a } else { b }
}

fn least_permissive(a: LicenseTier, b: LicenseTier) -> LicenseTier {
    if rank(a) <= rank(b) { a } else { b }
}

/// Guess an SPDX identifier from license text.
fn detect_from_text(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    let rules: &[(&str, &str)] = &[
        ("gnu affero general public license", "AGPL-3.0"),
        ("gnu lesser general public license", "LGPL-3.0"),
        ("gnu general public license", "GPL-3.0"),
        ("mozilla public license", "MPL-2.0"),
        ("apache license", "Apache-2.0"),
        ("mit license", "MIT"),
        ("permission is hereby granted, free of charge", "MIT"),
        ("isc license", "ISC"),
        ("redistribution and use in source and binary forms", "BSD-3-Clause"),
        ("this is free and unencumbered software", "Unlicense"),
    ];
    rules
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, id)| *id)
}

/// The license identifier an analysis should use, with its tier.
#[must_use]
pub(crate) fn effective_license(snapshot: &RepoSnapshot) -> Option<(String, LicenseTier)> {
    if let Some(spdx) = snapshot.license_spdx.as_deref() {
        let tier = classify_spdx(spdx);
        if tier != LicenseTier::None {
            return Some((spdx.to_string(), tier));
        }
    }
    let detected = snapshot
        .first_text(LICENSE_PATHS)
        .and_then(|text| detect_from_text(&text))?;
    Some((detected.to_string(), classify_spdx(detected)))
}

pub(crate) fn signals(snapshot: &RepoSnapshot) -> Vec<Signal> {
    let tier_signal = match effective_license(snapshot) {
        Some((id, LicenseTier::Permissive)) => {
            Signal::new(format!("Permissive license ({id})"), 40, true)
        }
        Some((id, LicenseTier::Copyleft)) => {
            Signal::new(format!("Copyleft license ({id})"), 20, true)
        }
        _ => Signal::new("Recognized license", 40, false),
    };

    vec![
        Signal::new("LICENSE file", 40, snapshot.has_any(LICENSE_PATHS)),
        Signal::new("License detected by GitHub", 20, snapshot.license_spdx.is_some()),
        tier_signal,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Category, CategoryResult};
    use crate::snapshot::test_support::snapshot;

    fn analyze(snap: &RepoSnapshot) -> CategoryResult {
        CategoryResult::from_signals(Category::License, signals(snap))
    }

    #[test]
    fn classifies_common_identifiers() {
        assert_eq!(classify_spdx("MIT"), LicenseTier::Permissive);
        assert_eq!(classify_spdx("Apache-2.0"), LicenseTier::Permissive);
        assert_eq!(classify_spdx("BSD-3-Clause"), LicenseTier::Permissive);
        assert_eq!(classify_spdx("GPL-3.0-only"), LicenseTier::Copyleft);
        assert_eq!(classify_spdx("LGPL-2.1"), LicenseTier::Copyleft);
        assert_eq!(classify_spdx("MPL-2.0"), LicenseTier::Copyleft);
        assert_eq!(classify_spdx("NOASSERTION"), LicenseTier::None);
        assert_eq!(classify_spdx("Proprietary"), LicenseTier::None);
    }

    #[test]
    fn spdx_expressions_combine_tiers() {
        assert_eq!(classify_spdx("MIT OR Apache-2.0"), LicenseTier::Permissive);
        assert_eq!(classify_spdx("(GPL-2.0 OR MIT)"), LicenseTier::Permissive);
        assert_eq!(classify_spdx("MIT AND GPL-3.0"), LicenseTier::Copyleft);
    }

    #[test]
    fn permissive_outscores_copyleft_outscores_none() {
        let mut permissive = snapshot(&["LICENSE"], &[]);
        permissive.license_spdx = Some("MIT".into());
        let mut copyleft = snapshot(&["LICENSE"], &[]);
        copyleft.license_spdx = Some("GPL-3.0".into());
        let none = snapshot(&["LICENSE"], &[]);

        let (p, c, n) = (analyze(&permissive), analyze(&copyleft), analyze(&none));
        assert_eq!(p.score, 100);
        assert_eq!(c.score, 80);
        assert_eq!(n.score, 40);
        assert!(p.signal("Permissive license (MIT)").is_some());
        assert!(n.signal("Recognized license").is_some_and(|s| !s.found));
    }

    #[test]
    fn falls_back_to_license_text() {
        let snap = snapshot(
            &["LICENSE"],
            &[("LICENSE", "Apache License\nVersion 2.0, January 2004\n")],
        );
        let result = analyze(&snap);
        assert_eq!(result.score, 80);
        assert!(result.signal("Permissive license (Apache-2.0)").is_some());
    }

    #[test]
    fn unlicensed_repository_scores_zero() {
        assert_eq!(analyze(&RepoSnapshot::default()).score, 0);
    }
}
