use async_trait::async_trait;
use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use crate::config::RunConfig;
use crate::models::BankRates;

pub mod http;
pub mod banks;
pub mod cbu;

pub use http::HttpFetcher;

/// Everything an adapter call is given: the run date, the shared fetcher
/// and where (if anywhere) raw pages should be dumped.
#[derive(Clone)]
pub struct RunContext {
    pub date: NaiveDate,
    pub fetcher: HttpFetcher,
    pub debug_dir: Option<PathBuf>,
}

impl RunContext {
    pub fn new(config: &RunConfig, fetcher: HttpFetcher) -> Self {
        Self {
            date: config.date,
            fetcher,
            debug_dir: config.debug_dir.clone(),
        }
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Name used to select this source on the command line.
    fn id(&self) -> &str;
    /// Display name written to the output.
    fn bank(&self) -> &str;
    async fn fetch_rates(&self, ctx: &RunContext) -> Result<BankRates>;
}
