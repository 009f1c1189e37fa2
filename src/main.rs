use anyhow::{Context, Result};
use clap::Parser;
use issueaudit::audit::{self, AuditOutcome};
use issueaudit::cli::{AuditArgs, Cli, Command};
use issueaudit::config::{self, RuleOverrides};
use issueaudit::output::{format_rules, print_summary, write_report};
use issueaudit::rules::ALL_RULES;
use issueaudit::tracker::MantisClient;

async fn run_audit(args: AuditArgs) -> Result<()> {
    let overrides = match &args.profile {
        Some(path) => RuleOverrides::load(path)?,
        None => RuleOverrides::default(),
    };
    let config = config::resolve(&overrides)?;

    let settings = args.connection_settings();
    let tracker = MantisClient::new(&settings.server_url);
    let as_of = args.as_of.unwrap_or_else(chrono::Utc::now);

    let report = match audit::run(&tracker, &settings, config, as_of).await? {
        AuditOutcome::Skipped { .. } => return Ok(()),
        AuditOutcome::Completed(report) => report,
    };

    write_report(&report, &args.output)?;
    if !args.quiet {
        let path = args
            .output
            .to_str()
            .context("Report path is not valid UTF-8")?;
        print_summary(&report, path);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    issueaudit::logging::init_tracing(cli.log_json);

    match cli.command {
        Command::Rules => {
            print!("{}", format_rules(&ALL_RULES));
            Ok(())
        }
        Command::Audit(args) => run_audit(args).await,
    }
}
