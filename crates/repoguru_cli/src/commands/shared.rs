use std::future::Future;
use std::sync::Arc;

use clap::ValueEnum;
use console::style;
use serde::Serialize;
use tabled::Table;
use tabled::settings::Style;

use crate::progress::ProgressReporter;
use crate::shutdown::until_shutdown;

/// Output format shared by every command that prints data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as formatted tables (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

pub(crate) type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn print_json<T: Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_table<T: tabled::Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

pub(crate) fn heading(text: &str) {
    println!();
    println!("{}", style(text).bold().underlined());
}

/// Run a library call with progress reporting, stopping early on Ctrl+C.
pub(crate) async fn with_progress<T, E, F, Fut>(work: F) -> Result<T, Box<dyn std::error::Error>>
where
    F: FnOnce(repoguru::ProgressCallback) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    let reporter = Arc::new(ProgressReporter::new());
    let outcome = until_shutdown(work(reporter.as_callback())).await;
    reporter.finish();
    match outcome {
        Some(result) => Ok(result?),
        None => Err("Interrupted".into()),
    }
}

/// Render a 0-100 score in the color of its grade.
pub(crate) fn colored_score(score: u8) -> String {
    let grade = repoguru::grade(score);
    let text = format!("{:>3}", score);
    match grade {
        'A' | 'B' => style(text).green().to_string(),
        'C' => style(text).yellow().to_string(),
        _ => style(text).red().to_string(),
    }
}

pub(crate) fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_default_is_table() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(percent(0.5), "50.0%");
        assert_eq!(percent(0.1234), "12.3%");
    }

    #[test]
    fn colored_score_keeps_the_number() {
        console::set_colors_enabled(false);
        assert_eq!(colored_score(7), "  7");
        assert_eq!(colored_score(100), "100");
    }

    #[tokio::test]
    async fn with_progress_passes_results_through() {
        let value = with_progress(|_callback| async { Ok::<_, std::io::Error>(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);

        let err = with_progress(|_callback| async {
            Err::<(), _>(std::io::Error::other("boom"))
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
