//! Derived git history statistics.
//!
//! Every dataset here is a pure reduction over a [`GitStatsData`] fetch and
//! is recomputed in full each time. Statistics endpoints that answered with
//! nothing are treated as empty inputs.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::github::types::{CommitDetail, CommitRecord, GitStatsData, RepoStatistics};

pub mod diff;

pub use diff::{
    ChangeKind, FileDiff, LineStats, added_stats, diff_file_sets, line_diff, modified_stats,
    removed_stats,
};

/// Share of commits the smallest contributor set must reach.
pub const BUS_FACTOR_THRESHOLD_PERCENT: u64 = 50;
/// Pairs changed together fewer times than this are not reported.
pub const MIN_CO_CHANGES: u32 = 2;
pub const MAX_COUPLING_PAIRS: usize = 50;
pub const MAX_CHURN_FILES: usize = 100;

const CONVENTIONAL_TYPES: &[&str] = &[
    "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore", "revert",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorShare {
    pub author: String,
    pub commits: u64,
    /// Fraction of all listed commits, 0.0 to 1.0.
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusFactor {
    /// Smallest number of authors whose commits reach the threshold.
    pub factor: usize,
    pub total_commits: u64,
    /// The authors counted towards `factor`, busiest first.
    pub key_authors: Vec<AuthorShare>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorSummary {
    pub login: String,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
    pub first_week: Option<DateTime<Utc>>,
    pub last_week: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFrequencyWeek {
    pub week: Option<DateTime<Utc>>,
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyCommits {
    pub week: Option<DateTime<Utc>>,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChurn {
    pub path: String,
    pub commits: u32,
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCoupling {
    pub file_a: String,
    pub file_b: String,
    pub co_changes: u32,
    /// `co_changes / max(changes(file_a), changes(file_b))`.
    pub confidence: f64,
}

/// Commit counts bucketed by total changed lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDistribution {
    /// 10 lines or fewer.
    pub xs: u32,
    /// 11 to 50.
    pub s: u32,
    /// 51 to 250.
    pub m: u32,
    /// 251 to 1000.
    pub l: u32,
    pub xl: u32,
}

impl SizeDistribution {
    fn record(&mut self, changed: u64) {
        match changed {
            0..=10 => self.xs += 1,
            11..=50 => self.s += 1,
            51..=250 => self.m += 1,
            251..=1000 => self.l += 1,
            _ => self.xl += 1,
        }
    }
}

/// One week of `stats/participation`; `others` excludes the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationWeek {
    pub owner: u32,
    pub others: u32,
}

/// Owner versus everyone else over the last year, oldest week first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipationSummary {
    pub weeks: Vec<ParticipationWeek>,
    /// Owner commits over all commits; 0 when nobody committed.
    pub owner_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    pub share: f64,
}

/// Everything derived from one statistics fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitStatsBundle {
    pub commits_analyzed: usize,
    pub details_analyzed: usize,
    pub bus_factor: BusFactor,
    pub contributors: Vec<ContributorSummary>,
    pub code_frequency: Vec<CodeFrequencyWeek>,
    pub weekly_commits: Vec<WeeklyCommits>,
    pub participation: ParticipationSummary,
    /// `[day][hour]`, Sunday first, UTC.
    pub punch_card: [[u32; 24]; 7],
    pub file_churn: Vec<FileChurn>,
    pub coupling: Vec<FileCoupling>,
    /// Sunday first.
    pub commits_by_weekday: [u32; 7],
    /// Keyed by `YYYY-MM`.
    pub commits_by_month: BTreeMap<String, u32>,
    pub size_distribution: SizeDistribution,
    /// Fraction of commit subjects following Conventional Commits.
    pub conventional_ratio: f64,
    pub languages: Vec<LanguageShare>,
}

impl GitStatsBundle {
    /// Reduce fetched history into the derived datasets.
    #[must_use]
    pub fn from_data(data: &GitStatsData) -> Self {
        let stats = &data.statistics;
        let (commits_by_weekday, commits_by_month) = temporal_patterns(&data.commits);
        Self {
            commits_analyzed: data.commits.len(),
            details_analyzed: data.details.len(),
            bus_factor: bus_factor(&data.commits),
            contributors: contributors(stats),
            code_frequency: code_frequency(stats),
            weekly_commits: weekly_commits(stats),
            participation: participation(stats),
            punch_card: punch_card(stats),
            file_churn: file_churn(&data.details),
            coupling: file_coupling(&data.details),
            commits_by_weekday,
            commits_by_month,
            size_distribution: size_distribution(&data.details),
            conventional_ratio: conventional_ratio(&data.commits),
            languages: language_shares(stats),
        }
    }
}

fn week_start(epoch: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(epoch, 0)
}

/// Minimum number of authors covering a majority of commits.
#[must_use]
pub fn bus_factor(commits: &[CommitRecord]) -> BusFactor {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for commit in commits {
        *counts.entry(commit.author_key()).or_default() += 1;
    }
    let total = commits.len() as u64;
    if total == 0 {
        return BusFactor::default();
    }

    let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut covered = 0;
    let mut key_authors = Vec::new();
    for (author, commits) in ranked {
        covered += commits;
        key_authors.push(AuthorShare {
            author,
            commits,
            share: commits as f64 / total as f64,
        });
        if covered * 100 >= total * BUS_FACTOR_THRESHOLD_PERCENT {
            break;
        }
    }

    BusFactor {
        factor: key_authors.len(),
        total_commits: total,
        key_authors,
    }
}

fn contributors(stats: &RepoStatistics) -> Vec<ContributorSummary> {
    let mut summaries: Vec<ContributorSummary> = stats
        .contributors
        .iter()
        .flatten()
        .map(|c| {
            let active = c.weeks.iter().filter(|w| w.c > 0);
            ContributorSummary {
                login: c
                    .author
                    .as_ref()
                    .map_or_else(|| "unknown".to_string(), |a| a.login.clone()),
                commits: c.total,
                additions: c.weeks.iter().map(|w| w.a).sum(),
                deletions: c.weeks.iter().map(|w| w.d).sum(),
                first_week: active.clone().map(|w| w.w).min().and_then(week_start),
                last_week: active.map(|w| w.w).max().and_then(week_start),
            }
        })
        .collect();
    summaries.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.login.cmp(&b.login)));
    summaries
}

fn code_frequency(stats: &RepoStatistics) -> Vec<CodeFrequencyWeek> {
    stats
        .code_frequency
        .iter()
        .flatten()
        .map(|&(week, additions, deletions)| CodeFrequencyWeek {
            week: week_start(week),
            additions: additions.unsigned_abs(),
            deletions: deletions.unsigned_abs(),
        })
        .collect()
}

fn weekly_commits(stats: &RepoStatistics) -> Vec<WeeklyCommits> {
    stats
        .commit_activity
        .iter()
        .flatten()
        .map(|a| WeeklyCommits {
            week: week_start(a.week),
            total: a.total,
        })
        .collect()
}

/// Pairs the `all` and `owner` series week by week. A missing owner week
/// counts as zero.
fn participation(stats: &RepoStatistics) -> ParticipationSummary {
    let Some(raw) = &stats.participation else {
        return ParticipationSummary::default();
    };
    let weeks: Vec<ParticipationWeek> = raw
        .all
        .iter()
        .enumerate()
        .map(|(i, &all)| {
            let owner = raw.owner.get(i).copied().unwrap_or(0).min(all);
            ParticipationWeek {
                owner,
                others: all - owner,
            }
        })
        .collect();

    let owner: u64 = weeks.iter().map(|w| u64::from(w.owner)).sum();
    let total: u64 = raw.all.iter().map(|&c| u64::from(c)).sum();
    ParticipationSummary {
        weeks,
        owner_share: if total == 0 { 0.0 } else { owner as f64 / total as f64 },
    }
}

fn punch_card(stats: &RepoStatistics) -> [[u32; 24]; 7] {
    let mut grid = [[0; 24]; 7];
    for &(day, hour, commits) in stats.punch_card.iter().flatten() {
        if let Some(cell) = grid
            .get_mut(usize::from(day))
            .and_then(|row| row.get_mut(usize::from(hour)))
        {
            *cell += commits;
        }
    }
    grid
}

fn file_churn(details: &[CommitDetail]) -> Vec<FileChurn> {
    let mut churn: HashMap<&str, FileChurn> = HashMap::new();
    for detail in details {
        for file in &detail.files {
            let entry = churn
                .entry(file.filename.as_str())
                .or_insert_with(|| FileChurn {
                    path: file.filename.clone(),
                    commits: 0,
                    additions: 0,
                    deletions: 0,
                });
            entry.commits += 1;
            entry.additions += file.additions;
            entry.deletions += file.deletions;
        }
    }
    let mut churn: Vec<FileChurn> = churn.into_values().collect();
    churn.sort_by(|a, b| {
        b.commits
            .cmp(&a.commits)
            .then_with(|| (b.additions + b.deletions).cmp(&(a.additions + a.deletions)))
            .then_with(|| a.path.cmp(&b.path))
    });
    churn.truncate(MAX_CHURN_FILES);
    churn
}

/// Files that tend to change in the same commit.
#[must_use]
pub fn file_coupling(details: &[CommitDetail]) -> Vec<FileCoupling> {
    let mut changes: HashMap<&str, u32> = HashMap::new();
    let mut pairs: HashMap<(&str, &str), u32> = HashMap::new();

    for detail in details {
        let mut files: Vec<&str> = detail.files.iter().map(|f| f.filename.as_str()).collect();
        files.sort_unstable();
        files.dedup();
        for (i, &a) in files.iter().enumerate() {
            *changes.entry(a).or_default() += 1;
            for &b in &files[i + 1..] {
                *pairs.entry((a, b)).or_default() += 1;
            }
        }
    }

    let mut coupling: Vec<FileCoupling> = pairs
        .into_iter()
        .filter(|&(_, co)| co >= MIN_CO_CHANGES)
        .map(|((a, b), co)| {
            let max = changes[a].max(changes[b]);
            FileCoupling {
                file_a: a.to_string(),
                file_b: b.to_string(),
                co_changes: co,
                confidence: f64::from(co) / f64::from(max),
            }
        })
        .collect();
    coupling.sort_by(|x, y| {
        y.co_changes
            .cmp(&x.co_changes)
            .then_with(|| x.file_a.cmp(&y.file_a))
            .then_with(|| x.file_b.cmp(&y.file_b))
    });
    coupling.truncate(MAX_COUPLING_PAIRS);
    coupling
}

fn temporal_patterns(commits: &[CommitRecord]) -> ([u32; 7], BTreeMap<String, u32>) {
    let mut weekdays = [0; 7];
    let mut months = BTreeMap::new();
    for date in commits.iter().filter_map(CommitRecord::date) {
        weekdays[date.weekday().num_days_from_sunday() as usize] += 1;
        *months
            .entry(format!("{:04}-{:02}", date.year(), date.month()))
            .or_default() += 1;
    }
    (weekdays, months)
}

fn size_distribution(details: &[CommitDetail]) -> SizeDistribution {
    let mut sizes = SizeDistribution::default();
    for detail in details {
        sizes.record(detail.changed_lines());
    }
    sizes
}

/// Whether a subject reads `type(scope)!: description`.
#[must_use]
pub fn is_conventional(subject: &str) -> bool {
    let Some((head, description)) = subject.split_once(':') else {
        return false;
    };
    if description.trim().is_empty() {
        return false;
    }
    let head = head.strip_suffix('!').unwrap_or(head);
    let kind = match head.split_once('(') {
        Some((kind, scope)) => {
            let Some(scope) = scope.strip_suffix(')') else {
                return false;
            };
            if scope.is_empty() || scope.contains(['(', ')']) {
                return false;
            }
            kind
        }
        None => head,
    };
    CONVENTIONAL_TYPES.contains(&kind.to_ascii_lowercase().as_str())
}

fn conventional_ratio(commits: &[CommitRecord]) -> f64 {
    if commits.is_empty() {
        return 0.0;
    }
    let conventional = commits
        .iter()
        .filter(|c| is_conventional(c.subject()))
        .count();
    conventional as f64 / commits.len() as f64
}

fn language_shares(stats: &RepoStatistics) -> Vec<LanguageShare> {
    let Some(languages) = &stats.languages else {
        return Vec::new();
    };
    let total: u64 = languages.values().sum();
    let mut shares: Vec<LanguageShare> = languages
        .iter()
        .map(|(language, &bytes)| LanguageShare {
            language: language.clone(),
            bytes,
            share: if total == 0 {
                0.0
            } else {
                bytes as f64 / total as f64
            },
        })
        .collect();
    shares.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.language.cmp(&b.language)));
    shares
}
