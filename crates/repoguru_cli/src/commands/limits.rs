use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use repoguru::github::types::RateLimitResource;

use crate::commands::shared::{CommandResult, OutputFormat, percent, print_json, print_table};
use crate::config::Config;

#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct LimitRow {
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
    #[tabled(rename = "Used")]
    pub used: String,
    #[tabled(rename = "Resets")]
    pub resets: String,
}

impl LimitRow {
    fn new(name: &str, resource: &RateLimitResource, now: DateTime<Utc>) -> Self {
        let reset_at = resource.reset_at();
        let wait = (reset_at - now).num_seconds();
        let resets = if wait > 0 {
            format!("{} (in {})", reset_at.format("%H:%M:%S UTC"), humanize_seconds(wait))
        } else {
            "now".to_string()
        };

        Self {
            resource: name.to_string(),
            remaining: format!("{} / {}", resource.remaining, resource.limit),
            used: if resource.limit == 0 {
                "-".to_string()
            } else {
                percent(resource.used as f64 / resource.limit as f64)
            },
            resets,
        }
    }
}

/// Rows ordered by resource name, relative to `now`.
pub(crate) fn limit_rows(
    resources: &BTreeMap<String, RateLimitResource>,
    now: DateTime<Utc>,
) -> Vec<LimitRow> {
    resources
        .iter()
        .map(|(name, resource)| LimitRow::new(name, resource, now))
        .collect()
}

pub(crate) async fn handle_limits(output: OutputFormat, config: &Config) -> CommandResult {
    let client = config.github_client()?;
    if !client.has_token() {
        tracing::info!("No GitHub token configured; showing anonymous limits");
    }
    let limits = client.get_rate_limits().await?;

    match output {
        OutputFormat::Json => print_json(&limits.resources),
        OutputFormat::Table => {
            print_table(limit_rows(&limits.resources, Utc::now()));
            Ok(())
        }
    }
}

/// `42s`, `2m 5s`, `1h 5m`; seconds are dropped once hours appear.
fn humanize_seconds(secs: i64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    match (hours, minutes, seconds) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, 0, _) => format!("{h}h"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}
