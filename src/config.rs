use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::scan::default_m2_repository;

pub const THREADS_ENV: &str = "CLASS_REFS_THREADS";

pub fn resolve_m2_repo(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.m2.clone() {
        return Ok(p);
    }
    default_m2_repository()
}

/// Explicit inputs win; otherwise the local Maven repository is searched.
pub fn resolve_inputs(cli: &Cli, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if !inputs.is_empty() {
        return Ok(inputs.to_vec());
    }
    Ok(vec![resolve_m2_repo(cli)?])
}

/// `--threads`, then `CLASS_REFS_THREADS`, then rayon's default (`None`).
pub fn resolve_threads(cli: &Cli) -> Result<Option<usize>> {
    if let Some(n) = cli.threads {
        return Ok(Some(n).filter(|n| *n > 0));
    }
    match env::var(THREADS_ENV) {
        Ok(raw) => parse_threads(&raw).map(|n| Some(n).filter(|n| *n > 0)),
        Err(_) => Ok(None),
    }
}

fn parse_threads(raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .with_context(|| format!("{THREADS_ENV} must be a thread count, got {raw:?}"))
}

pub fn init_thread_pool(threads: Option<usize>) -> Result<()> {
    let Some(threads) = threads else {
        return Ok(());
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("Failed to configure rayon thread pool")?;
    tracing::debug!("Using {threads} search threads");
    Ok(())
}

pub fn log_level(verbosity: u8) -> tracing::Level {
    match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Installs the stderr log subscriber. Call once, before any search runs.
pub fn init_logging(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
