//! sitecheck - health checks for a statically hosted podcast site
//!
//! ## Commands
//!
//! - `check-local`: validate the working tree before a push
//! - `check-page <slug>`: validate one deployed episode page
//! - `check-deploy`: wait for the deploy, then validate the live site

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn, Level};

use sitecheck_core::report::write_json_report;
use sitecheck_core::{init_tracing, ConsoleSink, SiteConfig, EXIT_USAGE};
use sitecheck_suites::{
    deploy_suite, local_suite, page_suite, CheckContext, CheckPipeline, ExitGate, Suite,
};

#[derive(Parser)]
#[command(name = "sitecheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pre-push and post-deploy health checks for a static podcast site", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Site repository root
    #[arg(long, global = true, default_value = ".")]
    repo_dir: PathBuf,

    /// Base URL of the deployed site
    #[arg(long, global = true, env = "SITECHECK_BASE_URL")]
    base_url: Option<String>,

    /// Also write the run as JSON to this path
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the site tree before pushing
    CheckLocal,

    /// Validate one deployed episode page
    CheckPage {
        /// Episode slug, e.g. 042-rust-in-production
        #[arg(value_parser = parse_slug)]
        slug: String,
    },

    /// Wait for the site to come up, then validate the deploy
    CheckDeploy {
        /// Seconds between readiness probes
        #[arg(long)]
        interval: Option<u64>,

        /// Give up waiting for readiness after this many seconds
        #[arg(long)]
        max_wait: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = load_config(&cli.repo_dir, cli.base_url.as_deref())?;

    let suite = match &cli.command {
        Commands::CheckLocal => local_suite(&config),
        Commands::CheckPage { slug } => page_suite(&config, slug),
        Commands::CheckDeploy { interval, max_wait } => {
            if let Some(secs) = interval {
                config.poll_interval_secs = *secs;
            }
            if let Some(secs) = max_wait {
                config.max_wait_secs = *secs;
            }
            deploy_suite(&config)
        }
    };

    run_suite(&suite, &cli.repo_dir, config, cli.report.as_deref()).await
}

/// A slug names one directory under the content dir.
fn parse_slug(s: &str) -> Result<String, String> {
    match s {
        "" => Err("slug must not be empty".to_string()),
        "." | ".." => Err(format!("'{s}' is not an episode slug")),
        _ if s.contains(['/', '\\']) => {
            Err(format!("slug '{s}' must be a single path segment"))
        }
        _ => Ok(s.to_string()),
    }
}

/// Defaults, `sitecheck.toml` and environment, then the `--base-url` flag.
fn load_config(repo_dir: &Path, base_url: Option<&str>) -> Result<SiteConfig> {
    let mut config = SiteConfig::load(repo_dir)
        .with_context(|| format!("Failed to load configuration from {}", repo_dir.display()))?;
    if let Some(url) = base_url {
        config = config.with_base_url(url);
        config.validate().context("Invalid --base-url")?;
    }
    Ok(config)
}

async fn run_suite(
    suite: &Suite,
    repo_dir: &Path,
    config: SiteConfig,
    report: Option<&Path>,
) -> Result<ExitCode> {
    info!(suite = %suite.name, repo = %repo_dir.display(), base_url = %config.base_url, "Running checks");

    let mut ctx = if suite.is_remote() {
        CheckContext::remote(repo_dir, config).context("Failed to build HTTP client")?
    } else {
        CheckContext::local(repo_dir, config)
    };
    let mut sink = ConsoleSink::stdout();
    let run = CheckPipeline::run(suite, &mut ctx, &mut sink).await;

    // The checks already ran; a lost report must not change their verdict.
    if let Some(path) = report {
        match write_json_report(&run, path) {
            Ok(()) => info!(path = %path.display(), "Report written"),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write report");
                eprintln!("warning: failed to write report to {}: {e}", path.display());
            }
        }
    }

    let verdict = ExitGate::evaluate(&run);
    info!(run_id = %run.run_id, passed = verdict.passed, "{}", verdict.message);
    Ok(ExitCode::from(verdict.exit_code))
}
