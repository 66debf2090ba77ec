use console::style;
use repoguru::{Category, ScanReport, scan_org, scan_user};
use tabled::Tabled;

use crate::commands::shared::{
    CommandResult, OutputFormat, colored_score, heading, print_json, print_table, with_progress,
};
use crate::config::Config;

/// Whose repositories to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanTarget {
    Org,
    User,
}

#[derive(Debug, Tabled)]
struct ScanTableRow {
    #[tabled(rename = "Repository")]
    repo: String,
    #[tabled(rename = "★")]
    stars: u64,
    #[tabled(rename = "Grade")]
    grade: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Weakest")]
    weakest: String,
}

impl ScanTableRow {
    fn rows(report: &ScanReport) -> Vec<Self> {
        report
            .rows
            .iter()
            .map(|row| {
                let weakest = row
                    .scores
                    .iter()
                    .min_by_key(|&(_, score)| *score)
                    .map(|(category, score)| format!("{} ({})", category, score));
                Self {
                    repo: row.repo.clone(),
                    stars: row.stars,
                    grade: row.grade.map_or_else(|| "-".to_string(), String::from),
                    score: row.overall_score.map_or_else(|| "-".to_string(), colored_score),
                    weakest: match (&row.error, weakest) {
                        (Some(error), _) => style(error).red().to_string(),
                        (None, Some(weakest)) => weakest,
                        (None, None) => String::new(),
                    },
                }
            })
            .collect()
    }
}

#[derive(Debug, Tabled)]
struct AverageRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Average")]
    average: String,
}

pub(crate) async fn handle_scan(
    target: ScanTarget,
    name: &str,
    limit: Option<usize>,
    output: OutputFormat,
    config: &Config,
) -> CommandResult {
    let client = config.github_client()?;
    let client = &client;

    let report = match target {
        ScanTarget::Org => {
            let limit = limit.unwrap_or(config.scan.org_limit);
            with_progress(|cb| async move { scan_org(client, name, limit, Some(&cb)).await }).await?
        }
        ScanTarget::User => {
            let limit = limit.unwrap_or(config.scan.portfolio_limit);
            with_progress(|cb| async move { scan_user(client, name, limit, Some(&cb)).await })
                .await?
        }
    };

    match output {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            print_scan(&report);
            Ok(())
        }
    }
}

fn print_scan(report: &ScanReport) {
    if report.rows.is_empty() {
        println!("No repositories to analyze for {}", report.namespace);
        return;
    }

    heading(&format!("Repositories of {}", report.namespace));
    print_table(ScanTableRow::rows(report));

    heading("Grades");
    let distribution: Vec<String> = report
        .grade_distribution
        .iter()
        .map(|(grade, count)| format!("{}: {}", grade, count))
        .collect();
    println!("  {}", distribution.join("  "));

    if !report.category_averages.is_empty() {
        heading("Category averages");
        print_table(
            Category::ALL
                .into_iter()
                .filter_map(|category| {
                    report
                        .category_averages
                        .get(&category)
                        .map(|&average| AverageRow {
                            category: category.label().to_string(),
                            average: colored_score(average),
                        })
                })
                .collect(),
        );
    }

    let failed = report.failures().count();
    if failed > 0 {
        println!();
        println!(
            "{}",
            style(format!("{} repositories could not be analyzed", failed)).yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use repoguru::scan::ScanRow;

    use super::*;

    #[test]
    fn table_rows_show_errors_and_weakest_category() {
        console::set_colors_enabled(false);
        let report = ScanReport {
            namespace: "acme".into(),
            rows: vec![
                ScanRow {
                    repo: "acme/a".into(),
                    stars: 3,
                    overall_score: Some(61),
                    grade: Some('C'),
                    scores: BTreeMap::from([(Category::Security, 20), (Category::License, 100)]),
                    error: None,
                },
                ScanRow {
                    repo: "acme/b".into(),
                    stars: 1,
                    overall_score: None,
                    grade: None,
                    scores: BTreeMap::new(),
                    error: Some("GitHub API error (404)".into()),
                },
            ],
            grade_distribution: BTreeMap::from([('C', 1)]),
            category_averages: BTreeMap::new(),
        };

        let rows = ScanTableRow::rows(&report);
        assert_eq!(rows[0].grade, "C");
        assert_eq!(rows[0].weakest, "Security (20)");
        assert_eq!(rows[1].grade, "-");
        assert_eq!(rows[1].score, "-");
        assert_eq!(rows[1].weakest, "GitHub API error (404)");
    }
}
