//! warden - schedule REUSE compliance checks for a list of repositories,
//! run them against the SSH check worker and print the resulting records.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use warden_core::impls::{GitLsRemoteResolver, InMemoryRepositoryStore, SshRemoteChecker};
use warden_core::{SchedulerBuilder, WardenConfig};

#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about = "REUSE compliance check scheduler")]
struct Cli {
    /// Repositories to check, without scheme (e.g. codeberg.org/fsfe/reuse)
    #[arg(required = true)]
    urls: Vec<String>,

    /// Re-check repositories even when their record is up to date
    #[arg(short, long)]
    force: bool,

    /// Path to the TOML configuration
    #[arg(short, long, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Override scheduler.concurrency
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log filter, e.g. "info" or "warden_core=debug". Overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

const DEFAULT_LOG_FILTER: &str = "info";

/// `--log-level` first, then `RUST_LOG`, then `info`.
fn log_directive(flag: Option<&str>, env: Option<String>) -> String {
    flag.map(str::to_string)
        .or(env.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn init_logging(cli: &Cli) -> Result<()> {
    let directive = log_directive(
        cli.log_level.as_deref(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    );
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter {directive:?}"))?;
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut config = match &cli.config {
        Some(path) => WardenConfig::load(path)?,
        None => WardenConfig::default(),
    };
    if let Some(concurrency) = cli.concurrency {
        config.scheduler.concurrency = concurrency;
    }

    let store = Arc::new(InMemoryRepositoryStore::new());
    let scheduler = SchedulerBuilder::new()
        .store(store.clone())
        .resolver(Arc::new(GitLsRemoteResolver::new()))
        .checker(Arc::new(SshRemoteChecker::new(config.ssh.clone())))
        .config(config.scheduler.clone())
        .build()
        .context("failed to build scheduler")?;

    info!(
        destination = %config.ssh.destination(),
        concurrency = config.scheduler.concurrency,
        "starting warden"
    );
    scheduler.run();

    for url in &cli.urls {
        if let Err(err) = scheduler.schedule(url, cli.force).await {
            warn!(%url, error = %err, "could not schedule check");
        }
    }

    scheduler.join().await;
    let counts = scheduler.counts();
    info!(checked = counts.checked, failed = counts.failed, "all checks finished");

    let records = store.records();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
