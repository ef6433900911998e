use anyhow::Result;
use tracing_subscriber::EnvFilter;
use crate::config::RunConfig;
use crate::core::orchestrator::Orchestrator;
use crate::fetcher::HttpFetcher;

pub mod config;
pub mod core;
pub mod extract;
pub mod fetcher;
pub mod models;

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Scrape every selected bank and write the output file.
/// Returns the number of banks written.
pub async fn run(config: RunConfig) -> Result<usize> {
    let orchestrator = Orchestrator::default();
    let out = orchestrator.run(&config, HttpFetcher::default()).await?;
    Ok(out.len())
}
