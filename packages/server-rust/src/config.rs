//! Configuration for the persistence engine and its command-line front end.
//!
//! Every struct has a `Default` matching the command-line defaults, so tests
//! and embedders can build configs without going through `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};

/// Location of and credentials for the GitHub repository holding translations.
#[derive(Debug, Clone, Args)]
pub struct GitHubConfig {
    /// Repository owner (user or organization).
    #[arg(long = "github-owner", env = "ROSETTA_GITHUB_OWNER", default_value = "phetsims")]
    pub owner: String,
    /// Repository name.
    #[arg(long = "github-repo", env = "ROSETTA_GITHUB_REPO", default_value = "babel")]
    pub repo: String,
    /// Branch reads and writes go to unless a call names another ref.
    #[arg(long = "github-branch", env = "ROSETTA_GITHUB_BRANCH", default_value = "main")]
    pub branch: String,
    /// Base URL of the REST API.
    #[arg(
        long = "github-api-url",
        env = "ROSETTA_GITHUB_API_URL",
        default_value = "https://api.github.com"
    )]
    pub api_base_url: String,
    /// Personal access or app token. Reads of public repos work without one.
    #[arg(long = "github-token", env = "ROSETTA_GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// `User-Agent` header; GitHub rejects requests without one.
    #[arg(long = "github-user-agent", default_value = "rosetta")]
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: "phetsims".to_string(),
            repo: "babel".to_string(),
            branch: "main".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            token: None,
            user_agent: "rosetta".to_string(),
        }
    }
}

/// Engine behaviour switches and timings.
#[derive(Debug, Clone, Args)]
pub struct EngineConfig {
    /// Skip every real write (dry run / debug).
    #[arg(long, env = "ROSETTA_DRY_RUN")]
    pub dry_run: bool,
    /// Accept submitted accessibility-only (`a11y.`) keys.
    #[arg(long, env = "ROSETTA_INCLUDE_A11Y_KEYS")]
    pub include_a11y_keys: bool,
    /// Wait before retrying a write that hit a version conflict.
    #[arg(long, default_value_t = 500)]
    pub conflict_retry_delay_ms: u64,
    /// Per-request timeout of the repository HTTP client.
    #[arg(long, default_value_t = 30_000)]
    pub http_timeout_ms: u64,
    /// How long a dirty stats entry may still be served.
    #[arg(long, default_value_t = 600_000)]
    pub stats_staleness_ms: u64,
    /// Interval between stats cache sweeps.
    #[arg(long, default_value_t = 60_000)]
    pub stats_sweep_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            include_a11y_keys: false,
            conflict_retry_delay_ms: 500,
            http_timeout_ms: 30_000,
            stats_staleness_ms: 600_000,
            stats_sweep_interval_ms: 60_000,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn conflict_retry_delay(&self) -> Duration {
        Duration::from_millis(self.conflict_retry_delay_ms)
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    #[must_use]
    pub fn stats_staleness(&self) -> Duration {
        Duration::from_millis(self.stats_staleness_ms)
    }

    #[must_use]
    pub fn stats_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.stats_sweep_interval_ms)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Command line of `rosetta-submit`.
#[derive(Debug, Clone, Parser)]
#[command(name = "rosetta-submit", about = "Persist one translation submission")]
pub struct CliArgs {
    /// Submission JSON document to persist.
    #[arg(long)]
    pub submission: PathBuf,
    /// Use an in-memory repository instead of GitHub.
    #[arg(long)]
    pub in_memory: bool,
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "ROSETTA_LOG_FORMAT")]
    pub log_format: LogFormat,
    #[command(flatten)]
    pub github: GitHubConfig,
    #[command(flatten)]
    pub engine: EngineConfig,
}
