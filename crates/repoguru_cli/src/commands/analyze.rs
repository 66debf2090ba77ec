use std::path::Path;

use console::style;
use repoguru::policy::{Policy, PolicyResult, Severity};
use repoguru::scoring::weight;
use repoguru::{AnalysisReport, GitStatsBundle, RepoRef, analyze_repo, evaluate, fetch_git_stats};
use serde::Serialize;
use tabled::Tabled;

use crate::commands::shared::{
    CommandResult, OutputFormat, colored_score, heading, percent, print_json, print_table,
    with_progress,
};
use crate::config::Config;

#[derive(Debug, Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Signals")]
    signals: String,
}

impl CategoryRow {
    fn rows(report: &AnalysisReport) -> Vec<Self> {
        report
            .categories
            .iter()
            .map(|c| Self {
                category: c.category.label().to_string(),
                score: colored_score(c.score),
                weight: format!("{}%", weight(c.category)),
                signals: format!(
                    "{}/{}",
                    c.signals.iter().filter(|s| s.found).count(),
                    c.signals.len()
                ),
            })
            .collect()
    }
}

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    report: &'a AnalysisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_stats: Option<&'a GitStatsBundle>,
}

pub(crate) async fn handle_analyze(
    repo: &str,
    stats: bool,
    output: OutputFormat,
    config: &Config,
) -> CommandResult {
    let repo = RepoRef::parse(repo)?;
    let client = config.github_client()?;
    let (client, target) = (&client, &repo);

    let report = with_progress(|cb| async move { analyze_repo(client, target, Some(&cb)).await })
        .await?;
    let git_stats = if stats || config.analysis.include_git_stats {
        Some(with_progress(|cb| async move { fetch_git_stats(client, target, Some(&cb)).await }).await?)
    } else {
        None
    };

    match output {
        OutputFormat::Json => print_json(&AnalyzeOutput {
            report: &report,
            git_stats: git_stats.as_ref(),
        }),
        OutputFormat::Table => {
            print_report(&report);
            if let Some(bundle) = &git_stats {
                print_git_stats(bundle);
            }
            Ok(())
        }
    }
}

pub(crate) async fn handle_stats(repo: &str, output: OutputFormat, config: &Config) -> CommandResult {
    let repo = RepoRef::parse(repo)?;
    let client = config.github_client()?;
    if !client.has_token() {
        tracing::warn!("No GitHub token configured; commit details will be skipped");
    }
    let (client, target) = (&client, &repo);

    let bundle =
        with_progress(|cb| async move { fetch_git_stats(client, target, Some(&cb)).await }).await?;

    match output {
        OutputFormat::Json => print_json(&bundle),
        OutputFormat::Table => {
            print_git_stats(&bundle);
            Ok(())
        }
    }
}

/// Where a policy comes from on the command line.
pub(crate) enum PolicySource<'a> {
    Preset(&'a str),
    File(&'a Path),
}

impl PolicySource<'_> {
    fn load(&self) -> Result<Policy, Box<dyn std::error::Error>> {
        Ok(match self {
            Self::Preset(name) => Policy::preset(name)?,
            Self::File(path) => Policy::from_json(&std::fs::read_to_string(path)?)?,
        })
    }
}

pub(crate) async fn handle_policy(
    repo: &str,
    source: PolicySource<'_>,
    output: OutputFormat,
    config: &Config,
) -> CommandResult {
    let policy = source.load()?;
    let repo = RepoRef::parse(repo)?;
    let client = config.github_client()?;
    let (client, target) = (&client, &repo);

    let report = with_progress(|cb| async move { analyze_repo(client, target, Some(&cb)).await })
        .await?;
    let result = evaluate(&report, &policy);

    match output {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_policy_result(&result),
    }

    if result.passed {
        Ok(())
    } else {
        Err(format!("Policy '{}' failed for {}", result.policy, repo).into())
    }
}

fn print_report(report: &AnalysisReport) {
    let meta = &report.repo_meta;
    println!(
        "{}  {}  {}",
        style(&meta.full_name).bold(),
        style(format!("grade {}", report.grade)).bold().cyan(),
        format_args!("{}/100", report.overall_score)
    );
    if let Some(description) = &meta.description {
        println!("{}", style(description).dim());
    }
    println!(
        "branch {} · ★ {} · forks {} · open issues {}{}",
        report.branch,
        meta.stars,
        meta.forks,
        meta.open_issues,
        if report.tree_truncated {
            " · tree truncated"
        } else {
            ""
        }
    );

    heading("Categories");
    print_table(CategoryRow::rows(report));

    if !report.strengths.is_empty() {
        heading("Strengths");
        for category in &report.strengths {
            println!("  {} {}", style("✓").green(), category);
        }
    }
    if !report.risks.is_empty() {
        heading("Risks");
        for category in &report.risks {
            println!("  {} {}", style("✗").red(), category);
        }
    }
    if !report.next_steps.is_empty() {
        heading("Next steps");
        for (i, step) in report.next_steps.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, step.category, step.action);
        }
    }
    if !report.tech_stack.is_empty() {
        heading("Tech stack");
        let names: Vec<&str> = report.tech_stack.iter().map(|t| t.name.as_str()).collect();
        println!("  {}", names.join(", "));
    }
}

#[derive(Debug, Tabled)]
struct ContributorRow {
    #[tabled(rename = "Contributor")]
    login: String,
    #[tabled(rename = "Commits")]
    commits: u64,
    #[tabled(rename = "+")]
    additions: u64,
    #[tabled(rename = "-")]
    deletions: u64,
}

#[derive(Debug, Tabled)]
struct ChurnRow {
    #[tabled(rename = "File")]
    path: String,
    #[tabled(rename = "Commits")]
    commits: u32,
    #[tabled(rename = "+")]
    additions: u64,
    #[tabled(rename = "-")]
    deletions: u64,
}

#[derive(Debug, Tabled)]
struct CouplingRow {
    #[tabled(rename = "File A")]
    file_a: String,
    #[tabled(rename = "File B")]
    file_b: String,
    #[tabled(rename = "Together")]
    co_changes: u32,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

const TOP_ROWS: usize = 10;

fn print_git_stats(bundle: &GitStatsBundle) {
    heading("History");
    println!(
        "  {} commits, {} with details, {} conventional",
        bundle.commits_analyzed,
        bundle.details_analyzed,
        percent(bundle.conventional_ratio)
    );
    let bus = &bundle.bus_factor;
    println!(
        "  bus factor {} over {} commits{}",
        bus.factor,
        bus.total_commits,
        if bus.key_authors.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = bus.key_authors.iter().map(|a| a.author.as_str()).collect();
            format!(" ({})", names.join(", "))
        }
    );
    if !bundle.participation.weeks.is_empty() {
        println!(
            "  owner wrote {} of the last year's commits",
            percent(bundle.participation.owner_share)
        );
    }
    let sizes = &bundle.size_distribution;
    println!(
        "  commit sizes xs {} · s {} · m {} · l {} · xl {}",
        sizes.xs, sizes.s, sizes.m, sizes.l, sizes.xl
    );

    if !bundle.languages.is_empty() {
        let shares: Vec<String> = bundle
            .languages
            .iter()
            .take(5)
            .map(|l| format!("{} {}", l.language, percent(l.share)))
            .collect();
        println!("  languages {}", shares.join(" · "));
    }

    if !bundle.contributors.is_empty() {
        heading("Top contributors");
        print_table(
            bundle
                .contributors
                .iter()
                .take(TOP_ROWS)
                .map(|c| ContributorRow {
                    login: c.login.clone(),
                    commits: c.commits,
                    additions: c.additions,
                    deletions: c.deletions,
                })
                .collect(),
        );
    }

    if !bundle.file_churn.is_empty() {
        heading("Most changed files");
        print_table(
            bundle
                .file_churn
                .iter()
                .take(TOP_ROWS)
                .map(|f| ChurnRow {
                    path: f.path.clone(),
                    commits: f.commits,
                    additions: f.additions,
                    deletions: f.deletions,
                })
                .collect(),
        );
    }

    if !bundle.coupling.is_empty() {
        heading("Files changed together");
        print_table(
            bundle
                .coupling
                .iter()
                .take(TOP_ROWS)
                .map(|c| CouplingRow {
                    file_a: c.file_a.clone(),
                    file_b: c.file_b.clone(),
                    co_changes: c.co_changes,
                    confidence: percent(c.confidence),
                })
                .collect(),
        );
    }
}

#[derive(Debug, Tabled)]
struct RuleRow {
    #[tabled(rename = "")]
    status: String,
    #[tabled(rename = "Rule")]
    name: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Expected")]
    expected: String,
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

fn print_policy_result(result: &PolicyResult) {
    heading(&format!("Policy {}", result.policy));
    print_table(
        result
            .outcomes
            .iter()
            .map(|o| RuleRow {
                status: if o.passed {
                    style("✓").green().to_string()
                } else {
                    style("✗").red().to_string()
                },
                name: o.rule_name.clone(),
                severity: severity_label(o.severity).to_string(),
                actual: o.actual.clone(),
                expected: o.expected.clone(),
            })
            .collect(),
    );
    let verdict = if result.passed {
        style("PASSED").green().bold()
    } else {
        style("FAILED").red().bold()
    };
    println!("{}", verdict);
}
