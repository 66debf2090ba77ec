//! Repo Guru CLI - engineering-health report cards for GitHub repositories.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::analyze::PolicySource;
use crate::commands::scan::ScanTarget;
use crate::commands::shared::OutputFormat;

#[derive(Parser)]
#[command(name = "repoguru")]
#[command(version)]
#[command(about = "Engineering-health report cards for GitHub repositories")]
#[command(
    long_about = "Repo Guru inspects a GitHub repository's tree and a bounded set of \
high-signal files, scores documentation, security, CI/CD, dependencies, code quality, \
license, community and OpenSSF practices, and turns them into a weighted grade with \
concrete next steps."
)]
#[command(after_long_help = r#"EXAMPLES
    Grade a repository:
        $ repoguru analyze rust-lang/cargo

    Include git history statistics, as JSON:
        $ repoguru analyze https://github.com/tokio-rs/tokio --stats --output json

    Grade a branch:
        $ repoguru analyze https://github.com/owner/repo/tree/feature/x

    Compare the most-starred repositories of an organization:
        $ repoguru org kubernetes --limit 10

    Gate CI on a policy:
        $ repoguru policy owner/repo --preset open-source-ready

CONFIGURATION
    Repo Guru reads configuration from:
      1. ~/.config/repoguru/config.toml (or $XDG_CONFIG_HOME/repoguru/config.toml)
      2. ./repoguru.toml
      3. Environment variables (REPOGURU_ prefix, e.g. REPOGURU_ANALYSIS__PACING_MS)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    REPOGURU_GITHUB_TOKEN     GitHub token (GITHUB_TOKEN is also honoured)
    REPOGURU_GITHUB__API_URL  API base for GitHub Enterprise Server
    RUST_LOG                  Log filter when output is not a terminal
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that print data.
#[derive(Debug, Clone, Args)]
struct OutputOptions {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, conflicts_with = "output")]
    json: bool,
}

impl OutputOptions {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score a repository across all eight categories
    Analyze {
        /// owner/repo or a github.com URL (optionally with /tree/<branch>)
        repo: String,

        /// Also fetch commit history and repository statistics
        #[arg(short, long)]
        stats: bool,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Git history statistics: bus factor, churn, coupling, contributors
    Stats {
        /// owner/repo or a github.com URL
        repo: String,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Light-analyze the most-starred repositories of an organization
    Org {
        /// Organization login
        org: String,

        /// Number of repositories to analyze (default from config or 20)
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Light-analyze a user's own repositories
    User {
        /// User login
        user: String,

        /// Number of repositories to analyze (default from config or 15)
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Analyze a repository and check it against a policy
    ///
    /// Exits with a non-zero status when an error-severity rule fails.
    Policy {
        /// owner/repo or a github.com URL
        repo: String,

        /// Built-in policy: open-source-ready, enterprise-grade, beginner-friendly
        #[arg(short, long, conflicts_with = "file", default_value = "open-source-ready")]
        preset: String,

        /// Policy JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Show current GitHub API rate limit status
    Limits {
        #[command(flatten)]
        output: OutputOptions,
    },
    /// Manage GitHub credentials
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Save a personal access token to the config file
    SetToken {
        /// GitHub token (ghp_..., gho_..., github_pat_...)
        token: String,
    },
    /// Authorize in the browser through the configured token proxy
    Login,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    shutdown::setup_shutdown_handler();

    // Progress bars on a terminal, structured logs everywhere else
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("repoguru=info,repoguru_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(());
    }

    let config = config::Config::load();

    match cli.command {
        Commands::Analyze {
            repo,
            stats,
            output,
        } => {
            commands::analyze::handle_analyze(&repo, stats, output.format(), &config).await?;
        }
        Commands::Stats { repo, output } => {
            commands::analyze::handle_stats(&repo, output.format(), &config).await?;
        }
        Commands::Org { org, limit, output } => {
            commands::scan::handle_scan(ScanTarget::Org, &org, limit, output.format(), &config)
                .await?;
        }
        Commands::User {
            user,
            limit,
            output,
        } => {
            commands::scan::handle_scan(ScanTarget::User, &user, limit, output.format(), &config)
                .await?;
        }
        Commands::Policy {
            repo,
            preset,
            file,
            output,
        } => {
            let source = match &file {
                Some(path) => PolicySource::File(path),
                None => PolicySource::Preset(&preset),
            };
            commands::analyze::handle_policy(&repo, source, output.format(), &config).await?;
        }
        Commands::Limits { output } => {
            commands::limits::handle_limits(output.format(), &config).await?;
        }
        Commands::Auth { action } => match action {
            AuthAction::SetToken { token } => commands::auth::handle_set_token(&token)?,
            AuthAction::Login => commands::auth::handle_login(&config).await?,
        },
        Commands::Completions { .. } => {}
    }

    Ok(())
}
