use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};
use crate::models::{BankRates, Currency, Rate};
use super::http::REFERENCE_TIMEOUT;
use super::RunContext;

pub const CBU_BASE_URL: &str = "https://cbu.uz/ru/arkhiv-kursov-valyut/json/all";
pub const CBU_BANK_NAME: &str = "CBU (справочно)";

#[derive(Debug, Deserialize)]
struct CbuEntry {
    #[serde(rename = "Ccy")]
    ccy: Option<String>,
    #[serde(rename = "Rate")]
    rate: Option<RawRate>,
}

// The archive publishes "Rate" as a string, but tolerate plain numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRate {
    Text(String),
    Number(f64),
}

impl RawRate {
    fn value(&self) -> Result<f64> {
        match self {
            RawRate::Number(n) => Ok(*n),
            RawRate::Text(s) => s.trim().parse::<f64>()
                .map_err(|e| anyhow!("bad rate {:?}: {}", s, e)),
        }
    }
}

/// Central Bank of Uzbekistan daily archive. One official rate per currency,
/// used only when no bank could be scraped.
pub struct CbuReference {
    base_url: String,
}

impl CbuReference {
    pub fn new() -> Self {
        Self::with_base_url(CBU_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, date: NaiveDate) -> String {
        format!("{}/{}/", self.base_url, date.format("%Y-%m-%d"))
    }

    /// Never fails: any problem is logged and reported as no result.
    pub async fn fetch(&self, ctx: &RunContext) -> Option<BankRates> {
        match self.try_fetch(ctx).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "cbu reference failed");
                None
            }
        }
    }

    async fn try_fetch(&self, ctx: &RunContext) -> Result<Option<BankRates>> {
        let url = self.url_for(ctx.date);
        let entries: Vec<CbuEntry> = ctx.fetcher.get_json(&url, REFERENCE_TIMEOUT).await?;
        let official = Self::parse_entries(&entries)?;

        let rates: Vec<Rate> = Currency::MAJORS
            .iter()
            .filter_map(|c| official.get(c.code()).map(|&v| Rate::new(*c, v, v)))
            .collect();

        if rates.is_empty() {
            info!(%url, "cbu reference has no major currencies");
            return Ok(None);
        }

        Ok(Some(BankRates {
            bank: CBU_BANK_NAME.to_string(),
            date: ctx.date,
            rates,
            source_url: url,
        }))
    }

    fn parse_entries(entries: &[CbuEntry]) -> Result<HashMap<String, f64>> {
        let mut official = HashMap::new();

        for entry in entries {
            let ccy = match entry.ccy.as_deref() {
                Some(c) if !c.is_empty() => c.to_uppercase(),
                _ => continue,
            };
            let rate = entry.rate.as_ref()
                .ok_or_else(|| anyhow!("{} has no Rate", ccy))?
                .value()?;
            official.insert(ccy, rate);
        }

        Ok(official)
    }
}

impl Default for CbuReference {
    fn default() -> Self {
        Self::new()
    }
}
