//! Dead-link crawler main entry point
//!
//! This is the command-line interface for the resumable broken-link crawler.

use anyhow::Context;
use clap::Parser;
use dead_link_crawler::config::{load_config, validate, Config};
use dead_link_crawler::crawler::{run_crawl, RunStatus};
use dead_link_crawler::output::print_statistics;
use dead_link_crawler::storage::{open_store, LoadOutcome, RunKey, SnapshotStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for a run stopped by SIGINT/SIGTERM
const EXIT_INTERRUPTED: u8 = 130;

/// Dead-link crawler: find broken links on a website, with resume support
///
/// Crawls breadth-first from START_URL up to MAX_DEPTH, probes every link it
/// finds once, and records broken links with the page they were found on.
/// State is saved periodically; running the same command again resumes an
/// interrupted crawl.
#[derive(Parser, Debug)]
#[command(name = "dead-link-crawler")]
#[command(version)]
#[command(about = "Find broken links on a website, with resume support", long_about = None)]
struct Cli {
    /// URL to start crawling from (http or https)
    #[arg(value_name = "START_URL")]
    start_url: Option<String>,

    /// Maximum crawl depth [default: 3]
    #[arg(value_name = "MAX_DEPTH")]
    max_depth: Option<u32>,

    /// Restrict crawling to the start URL's domain [default: true]
    #[arg(value_name = "SAME_DOMAIN_ONLY", value_parser = parse_flexible_bool)]
    same_domain_only: Option<bool>,

    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for state snapshots and the broken-link log
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Directory for final reports
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Start a fresh crawl, ignoring saved state
    #[arg(long)]
    fresh: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and show what would be crawled
    #[arg(long, conflicts_with_all = ["stats", "fresh"])]
    dry_run: bool,

    /// Show statistics from the saved state and exit
    #[arg(long, conflicts_with_all = ["dry_run", "fresh"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(RunStatus::Completed) => ExitCode::SUCCESS,
        Ok(RunStatus::Interrupted) => ExitCode::from(EXIT_INTERRUPTED),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunStatus> {
    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(RunStatus::Completed);
    }

    if cli.stats {
        handle_stats(&config)?;
        return Ok(RunStatus::Completed);
    }

    handle_crawl(config, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dead_link_crawler=info,warn"),
            1 => EnvFilter::new("dead_link_crawler=debug,info"),
            2 => EnvFilter::new("dead_link_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Parses booleans the way people type them on a command line
fn parse_flexible_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        other => Err(format!(
            "'{}' is not a boolean (use true/false, yes/no, 1/0)",
            other
        )),
    }
}

/// Loads the optional config file and overlays command-line arguments
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(start_url) = &cli.start_url {
        config.crawler.start_url = start_url.clone();
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(same_domain_only) = cli.same_domain_only {
        config.crawler.same_domain_only = same_domain_only;
    }
    if let Some(dir) = &cli.state_dir {
        config.output.state_dir = dir.clone();
    }
    if let Some(dir) = &cli.report_dir {
        config.output.report_dir = dir.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

fn run_key(config: &Config) -> RunKey {
    RunKey::new(
        config.crawler.start_url.clone(),
        config.crawler.max_depth,
        config.crawler.same_domain_only,
    )
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    let key = run_key(config);

    println!("=== Dead-Link Crawler Dry Run ===\n");

    println!("Crawl:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Same domain only: {}", config.crawler.same_domain_only);
    println!("  Delay between pages: {}ms", config.crawler.page_delay_ms);
    println!("  Page timeout: {}s", config.crawler.page_timeout_secs);
    println!("  Probe timeout: {}s", config.crawler.probe_timeout_secs);

    println!("\nLiveness:");
    println!(
        "  Watchdog: {}s idle, checked every {}s",
        config.liveness.watchdog_timeout_secs, config.liveness.watchdog_check_secs
    );
    println!(
        "  Checkpoint every: {}s",
        config.liveness.checkpoint_interval_secs
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!(
        "  State file: {}",
        config.output.state_dir.join(key.state_file_name()).display()
    );
    println!(
        "  Broken-link log: {}",
        config.output.state_dir.join(key.broken_log_file_name()).display()
    );
    println!("  Reports: {}", config.output.report_dir.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the saved state
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = open_store(&config.output.state_dir, run_key(config));
    println!("State file: {}\n", store.location().display());

    match store.load() {
        LoadOutcome::Loaded(state) => print_statistics(&state),
        LoadOutcome::Absent => println!("No saved state for this crawl configuration"),
        LoadOutcome::Malformed(reason) => {
            anyhow::bail!("Saved state is unusable: {}", reason)
        }
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<RunStatus> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume if saved state exists)");
    }

    let outcome = run_crawl(config, fresh).await.context("Crawl failed")?;

    match outcome.status {
        RunStatus::Completed => tracing::info!("Crawl completed successfully"),
        RunStatus::Interrupted => tracing::info!("Crawl stopped; progress saved"),
    }

    Ok(outcome.status)
}
