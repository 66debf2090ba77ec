//! Line-bag diff.
//!
//! Lines are compared as multisets: a line present in both versions (by exact
//! byte equality, with multiplicity) is neither an addition nor a deletion,
//! regardless of position. Reordered content therefore diffs as unchanged.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Added and deleted line counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    pub additions: u64,
    pub deletions: u64,
}

impl LineStats {
    #[must_use]
    pub fn changed(&self) -> u64 {
        self.additions + self.deletions
    }
}

impl std::ops::AddAssign for LineStats {
    fn add_assign(&mut self, rhs: Self) {
        self.additions += rhs.additions;
        self.deletions += rhs.deletions;
    }
}

/// Content containing a NUL byte is treated as binary.
#[must_use]
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.contains(&0)
}

/// Split on `\n`, dropping the empty segment left by a final newline.
fn lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Number of lines in text content; binary content has none.
#[must_use]
pub fn line_count(bytes: &[u8]) -> u64 {
    if is_binary(bytes) {
        0
    } else {
        lines(bytes).len() as u64
    }
}

/// Diff two versions of one file.
///
/// Either side absent or binary yields `0/0`.
#[must_use]
pub fn line_diff(old: Option<&[u8]>, new: Option<&[u8]>) -> LineStats {
    let (Some(old), Some(new)) = (old, new) else {
        return LineStats::default();
    };
    if is_binary(old) || is_binary(new) {
        return LineStats::default();
    }

    let mut balance: HashMap<&[u8], i64> = HashMap::new();
    for line in lines(new) {
        *balance.entry(line).or_default() += 1;
    }
    for line in lines(old) {
        *balance.entry(line).or_default() -= 1;
    }

    balance
        .values()
        .fold(LineStats::default(), |mut stats, &count| {
            if count > 0 {
                stats.additions += count as u64;
            } else {
                stats.deletions += count.unsigned_abs();
            }
            stats
        })
}

/// Stats for a file that only exists in the new version.
#[must_use]
pub fn added_stats(new: &[u8]) -> LineStats {
    LineStats {
        additions: line_count(new),
        deletions: 0,
    }
}

/// Stats for a file that only exists in the old version.
#[must_use]
pub fn removed_stats(old: &[u8]) -> LineStats {
    LineStats {
        additions: 0,
        deletions: line_count(old),
    }
}

/// Stats for a file present in both versions.
#[must_use]
pub fn modified_stats(old: &[u8], new: &[u8]) -> LineStats {
    line_diff(Some(old), Some(new))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub kind: ChangeKind,
    pub stats: LineStats,
}

/// Diff two path-to-content maps, in path order.
///
/// Paths whose content is byte-identical on both sides are omitted.
#[must_use]
pub fn diff_file_sets(
    old: &BTreeMap<String, Vec<u8>>,
    new: &BTreeMap<String, Vec<u8>>,
) -> Vec<FileDiff> {
    let paths: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    paths
        .into_iter()
        .filter_map(|path| {
            let (kind, stats) = match (old.get(path), new.get(path)) {
                (None, Some(n)) => (ChangeKind::Added, added_stats(n)),
                (Some(o), None) => (ChangeKind::Removed, removed_stats(o)),
                (Some(o), Some(n)) if o != n => (ChangeKind::Modified, modified_stats(o, n)),
                _ => return None,
            };
            Some(FileDiff {
                path: path.clone(),
                kind,
                stats,
            })
        })
        .collect()
}
