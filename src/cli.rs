use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ConnectionSettings;

#[derive(Parser, Debug)]
#[command(name = "issueaudit")]
#[command(about = "Audit tool for Mantis bug tracker backlogs")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch issues, flag risky ones and report distributions
    Audit(AuditArgs),
    /// List the rules and their default parameters
    Rules,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Base URL of the Mantis server
    #[arg(long, env = "MANTIS_SERVER_URL", default_value = "")]
    pub server_url: String,

    #[arg(long, env = "MANTIS_USERNAME", default_value = "")]
    pub username: String,

    /// API token of the user
    #[arg(long, env = "MANTIS_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Project whose issues are audited
    #[arg(long, env = "MANTIS_PROJECT", default_value = "")]
    pub project: String,

    /// Saved filter restricting the audited issues
    #[arg(long, env = "MANTIS_FILTER")]
    pub filter: Option<String>,

    /// TOML profile with rule parameter overrides
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Reference date for issue ages (RFC 3339), defaults to now
    #[arg(long, value_parser = parse_as_of)]
    pub as_of: Option<DateTime<Utc>>,

    /// Where to write the JSON report
    #[arg(long, short, default_value = "issueaudit-report.json")]
    pub output: PathBuf,

    /// Do not print the summary
    #[arg(long, short)]
    pub quiet: bool,
}

impl AuditArgs {
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            server_url: self.server_url.trim_end_matches('/').to_string(),
            username: self.username.clone(),
            password: self.password.clone(),
            project: self.project.clone(),
            filter: self.filter.clone(),
        }
    }
}

fn parse_as_of(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 date such as 2024-06-01T00:00:00Z: {}", e))
}
