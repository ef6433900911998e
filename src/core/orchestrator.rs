use anyhow::Result;
use tracing::{error, info, warn};
use crate::config::RunConfig;
use crate::core::output::write_rates;
use crate::core::rate_limiter::RateLimiter;
use crate::fetcher::banks::default_adapters;
use crate::fetcher::cbu::CbuReference;
use crate::fetcher::{HttpFetcher, RateSource, RunContext};
use crate::models::BankRates;

/// Runs the bank adapters in order and falls back to the central bank
/// reference when none of them produced rates.
pub struct Orchestrator {
    adapters: Vec<Box<dyn RateSource>>,
    reference: CbuReference,
}

impl Orchestrator {
    pub fn new(adapters: Vec<Box<dyn RateSource>>, reference: CbuReference) -> Self {
        Self { adapters, reference }
    }

    /// Adapters matching the `only` filter, in run order.
    pub fn selected(&self, only: Option<&str>) -> Vec<&dyn RateSource> {
        self.adapters
            .iter()
            .map(|a| a.as_ref())
            .filter(|a| only.map_or(true, |id| a.id() == id))
            .collect()
    }

    /// Run every selected adapter; a failing bank only shrinks the result.
    pub async fn collect(&self, config: &RunConfig, ctx: &RunContext) -> Vec<BankRates> {
        let adapters = self.selected(config.only.as_deref());
        if adapters.is_empty() {
            warn!(only = ?config.only, "no adapter matches the requested bank");
        }

        let limiter = RateLimiter::new(config.pause);
        let mut out = Vec::new();

        for (i, adapter) in adapters.iter().enumerate() {
            if i > 0 {
                limiter.wait().await;
            }

            info!(adapter = adapter.id(), "running adapter");
            match adapter.fetch_rates(ctx).await {
                Ok(br) if !br.is_empty() => {
                    info!(bank = %br.bank, currencies = br.rates.len(), "ok");
                    out.push(br);
                }
                Ok(br) => warn!(bank = %br.bank, "no rates found"),
                Err(e) => error!(adapter = adapter.id(), error = %e, "adapter failed"),
            }
        }

        if out.is_empty() && config.fallback {
            if let Some(reference) = self.reference.fetch(ctx).await {
                info!(bank = %reference.bank, "added central bank reference rates (not buy/sell)");
                out.push(reference);
            }
        }

        out
    }

    /// Collect rates and overwrite the output file. Only writing can fail.
    pub async fn run(&self, config: &RunConfig, fetcher: HttpFetcher) -> Result<Vec<BankRates>> {
        let ctx = RunContext::new(config, fetcher);
        let out = self.collect(config, &ctx).await;

        write_rates(&config.output, &out)?;
        info!(banks = out.len(), path = %config.output.display(), "wrote rates");
        Ok(out)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(default_adapters(), CbuReference::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use anyhow::anyhow;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use crate::fetcher::http::RetryPolicy;
    use crate::models::{Currency, Rate};

    enum Outcome {
        Rates(Vec<Rate>),
        Empty,
        Fails,
    }

    struct StubSource {
        id: &'static str,
        outcome: Outcome,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RateSource for StubSource {
        fn id(&self) -> &str {
            self.id
        }

        fn bank(&self) -> &str {
            self.id
        }

        async fn fetch_rates(&self, ctx: &RunContext) -> Result<BankRates> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rates = match &self.outcome {
                Outcome::Rates(r) => r.clone(),
                Outcome::Empty => vec![],
                Outcome::Fails => return Err(anyhow!("page layout changed")),
            };
            Ok(BankRates {
                bank: self.id.to_string(),
                date: ctx.date,
                rates,
                source_url: format!("https://{}.test/", self.id),
            })
        }
    }

    fn stub(id: &'static str, outcome: Outcome, calls: &Arc<AtomicUsize>) -> Box<dyn RateSource> {
        Box::new(StubSource { id, outcome, calls: calls.clone() })
    }

    fn config() -> RunConfig {
        let mut config = RunConfig::new(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        config.pause = Duration::ZERO;
        config.fallback = false;
        config
    }

    fn ctx(config: &RunConfig) -> RunContext {
        RunContext::new(config, HttpFetcher::new(RetryPolicy::none()))
    }

    fn usd() -> Vec<Rate> {
        vec![Rate::new(Currency::Usd, 12300.0, 12450.0)]
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::new(
            vec![
                stub("alpha", Outcome::Fails, &calls),
                stub("beta", Outcome::Empty, &calls),
                stub("gamma", Outcome::Rates(usd()), &calls),
            ],
            CbuReference::new(),
        );

        let config = config();
        let out = orch.collect(&config, &ctx(&config)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bank, "gamma");
        assert_eq!(out[0].date, config.date);
    }

    #[tokio::test]
    async fn test_only_runs_selected_adapter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::new(
            vec![
                stub("alpha", Outcome::Rates(usd()), &calls),
                stub("beta", Outcome::Rates(usd()), &calls),
            ],
            CbuReference::new(),
        );

        let mut config = config();
        config.only = Some("beta".to_string());
        let out = orch.collect(&config, &ctx(&config)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bank, "beta");
    }

    #[tokio::test]
    async fn test_unknown_selection_runs_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::new(vec![stub("alpha", Outcome::Rates(usd()), &calls)], CbuReference::new());

        let mut config = config();
        config.only = Some("nosuchbank".to_string());
        let out = orch.collect(&config, &ctx(&config)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_default_selection_order() {
        let orch = Orchestrator::default();
        let ids: Vec<_> = orch.selected(None).iter().map(|a| a.id().to_string()).collect();
        assert_eq!(ids, vec!["hamkorbank", "agrobank", "kapitalbank", "ipakyulibank", "tbcbank"]);
        assert_eq!(orch.selected(Some("kapitalbank")).len(), 1);
    }
}
