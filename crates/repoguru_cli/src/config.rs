//! Configuration file support for repoguru.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`REPOGURU_` prefix, `__` between section and key,
//!    e.g. `REPOGURU_ANALYSIS__PACING_MS`; `REPOGURU_GITHUB_TOKEN` and
//!    `GITHUB_TOKEN` are also honoured)
//! 3. Local config file (`./repoguru.toml`)
//! 4. XDG config file (`~/.config/repoguru/config.toml`)
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."
//! api_url = "https://api.github.com"
//!
//! [analysis]
//! pacing_ms = 100
//! request_timeout_secs = 30
//! requests_per_second = 10
//! include_git_stats = false
//!
//! [scan]
//! org_limit = 20
//! portfolio_limit = 15
//!
//! [oauth]
//! client_id = "Iv1...."
//! proxy_url = "https://repoguru.example"
//! redirect_uri = "https://repoguru.example/callback"
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs, io};

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use repoguru::github::GITHUB_API_URL;
use repoguru::oauth::OAuthConfig;
use repoguru::pacing::FixedDelay;
use repoguru::rate_limit::ApiRateLimiter;
use repoguru::scan::{DEFAULT_ORG_LIMIT, DEFAULT_USER_LIMIT};
use repoguru::{GitHubClient, GitHubError};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub analysis: AnalysisConfig,
    pub scan: ScanConfig,
    pub oauth: OAuthSettings,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access or OAuth token. Anonymous access when unset.
    pub token: Option<String>,
    /// API base, for GitHub Enterprise Server.
    pub api_url: Option<String>,
}

/// Request pacing and analysis defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Pause between sequential requests.
    pub pacing_ms: u64,
    pub request_timeout_secs: u64,
    /// Proactive client-side limit; unlimited when unset.
    pub requests_per_second: Option<u32>,
    /// Fetch git history on every `analyze`.
    pub include_git_stats: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pacing_ms: 100,
            request_timeout_secs: 30,
            requests_per_second: None,
            include_git_stats: false,
        }
    }
}

/// Defaults for multi-repository scans.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub org_limit: usize,
    pub portfolio_limit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            org_limit: DEFAULT_ORG_LIMIT,
            portfolio_limit: DEFAULT_USER_LIMIT,
        }
    }
}

/// Web authorization settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    pub client_id: Option<String>,
    /// Base URL of the token-exchange proxy.
    pub proxy_url: Option<String>,
    pub redirect_uri: Option<String>,
}

impl Config {
    /// Load layered configuration, falling back to defaults on any error.
    pub fn load() -> Self {
        Self::layered().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unusable configuration");
            Config::default()
        })
    }

    fn layered() -> Result<Self, ConfigError> {
        let files = Self::default_config_path()
            .into_iter()
            .chain([PathBuf::from("repoguru.toml")])
            .filter(|path| path.exists());

        let mut builder = files.fold(ConfigBuilder::builder(), |builder, path| {
            tracing::debug!(path = %path.display(), "Reading config file");
            builder.add_source(File::from(path).format(FileFormat::Toml))
        });

        // REPOGURU_ANALYSIS__PACING_MS -> analysis.pacing_ms
        builder = builder.add_source(
            Environment::with_prefix("REPOGURU")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Flat token variables; the last one set wins.
        let tokens = ["GITHUB_TOKEN", "REPOGURU_GITHUB_TOKEN"]
            .into_iter()
            .filter_map(|var| env::var(var).ok())
            .filter(|token| !token.trim().is_empty());
        for token in tokens {
            builder = builder.set_override("github.token", token)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Get the GitHub token.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(GITHUB_API_URL)
    }

    /// Build a client from the `[github]` and `[analysis]` sections.
    pub fn github_client(&self) -> Result<GitHubClient, GitHubError> {
        let token = self.github_token();
        let client = GitHubClient::with_timeout(
            self.api_url(),
            token.as_deref(),
            Duration::from_secs(self.analysis.request_timeout_secs),
        )?
        .with_pacer(Arc::new(FixedDelay(Duration::from_millis(
            self.analysis.pacing_ms,
        ))));

        Ok(match self.analysis.requests_per_second {
            Some(rps) => client.with_rate_limiter(ApiRateLimiter::new(rps)),
            None => client,
        })
    }

    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig {
            client_id: self.oauth.client_id.clone(),
            redirect_uri: self.oauth.redirect_uri.clone(),
            scope: None,
        }
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "repoguru").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Save a GitHub token to the config file.
    ///
    /// Creates the config file and parent directories if they don't exist.
    /// If a config file already exists, only `github.token` is touched and
    /// formatting, comments and other settings are preserved.
    pub fn save_github_token(token: &str) -> io::Result<PathBuf> {
        let config_path = Self::default_config_path().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine config directory",
            )
        })?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = if config_path.exists() {
            fs::read_to_string(&config_path)?
        } else {
            String::new()
        };

        fs::write(&config_path, with_github_token(&content, token)?)?;
        Ok(config_path)
    }
}

/// Set `github.token` in a TOML document, keeping everything else as is.
fn with_github_token(content: &str, token: &str) -> io::Result<String> {
    use toml_edit::{DocumentMut, value};

    let mut doc: DocumentMut = content.parse().map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("Invalid TOML: {}", e))
    })?;

    if !doc.contains_key("github") {
        doc["github"] = toml_edit::table();
    }
    doc["github"]["token"] = value(token);
    Ok(doc.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.api_url(), GITHUB_API_URL);
        assert_eq!(config.analysis.pacing_ms, 100);
        assert_eq!(config.analysis.request_timeout_secs, 30);
        assert!(config.analysis.requests_per_second.is_none());
        assert!(!config.analysis.include_git_stats);
        assert_eq!(config.scan.org_limit, 20);
        assert_eq!(config.scan.portfolio_limit, 15);
        assert!(config.oauth.client_id.is_none());
    }

    #[test]
    fn every_section_parses() {
        let config = parse(
            r#"
            [github]
            token = "ghp_test123"
            api_url = "https://ghe.example.com/api/v3"

            [analysis]
            pacing_ms = 0
            requests_per_second = 5
            include_git_stats = true

            [scan]
            org_limit = 50

            [oauth]
            client_id = "Iv1.abc"
            proxy_url = "https://proxy.example"
        "#,
        );

        assert_eq!(config.github_token().as_deref(), Some("ghp_test123"));
        assert_eq!(config.api_url(), "https://ghe.example.com/api/v3");
        assert_eq!(config.analysis.pacing_ms, 0);
        assert_eq!(config.analysis.requests_per_second, Some(5));
        assert!(config.analysis.include_git_stats);
        assert_eq!(config.scan.org_limit, 50);
        assert_eq!(config.scan.portfolio_limit, 15);
        assert_eq!(config.oauth_config().client_id.as_deref(), Some("Iv1.abc"));
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let config = parse(
            r#"
            [analysis]
            request_timeout_secs = 5
            unknown_field = "ignored"
        "#,
        );
        assert_eq!(config.analysis.request_timeout_secs, 5);
        assert_eq!(config.analysis.pacing_ms, 100);
    }

    #[test]
    fn blank_token_is_anonymous() {
        let config = parse("[github]\ntoken = \"  \"\n");
        assert!(config.github_token().is_none());
        assert!(!config.github_client().unwrap().has_token());
    }

    #[test]
    fn later_sources_override_earlier_ones() {
        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "[scan]\norg_limit = 30\nportfolio_limit = 3\n",
                FileFormat::Toml,
            ))
            .add_source(config::File::from_str(
                "[scan]\norg_limit = 40\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.scan.org_limit, 40);
        assert_eq!(config.scan.portfolio_limit, 3);
    }

    #[test]
    fn malformed_toml_fails_to_build() {
        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str("[scan\norg_limit = 1", FileFormat::Toml))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn saving_token_preserves_other_settings() {
        let original = "# my settings\n[scan]\norg_limit = 7 # keep\n";
        let updated = with_github_token(original, "gho_new").unwrap();
        assert!(updated.contains("# my settings"));
        assert!(updated.contains("org_limit = 7 # keep"));

        let config = parse(&updated);
        assert_eq!(config.github_token().as_deref(), Some("gho_new"));
        assert_eq!(config.scan.org_limit, 7);

        let replaced = with_github_token(&updated, "gho_newer").unwrap();
        assert_eq!(parse(&replaced).github_token().as_deref(), Some("gho_newer"));
    }

    #[test]
    fn saving_token_rejects_invalid_toml() {
        let err = with_github_token("[github", "t").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn config_path_is_namespaced() {
        if let Some(path) = Config::default_config_path() {
            assert!(path.to_string_lossy().contains("repoguru"));
        }
    }
}
