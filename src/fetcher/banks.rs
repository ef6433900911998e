use async_trait::async_trait;
use anyhow::{anyhow, Result};
use tracing::{info, warn};
use crate::core::output::save_debug_html;
use crate::extract::{scan_rows, DuplicatePolicy, OutputOrder, PairPosition, RowScope, ScanRules};
use crate::models::{BankRates, Currency};
use super::{RateSource, RunContext};

/// Where a bank publishes its rates and how its tables are laid out.
#[derive(Debug, Clone)]
pub struct BankProfile {
    pub id: &'static str,
    pub bank: &'static str,
    /// Candidate pages, tried in order until one yields rates.
    pub urls: Vec<String>,
    pub rules: ScanRules,
}

// Most banks quote buy then sell right after the currency code, once per page.
const FIRST_PAIR_MAJORS: ScanRules = ScanRules {
    scope: RowScope::AnyRow,
    recognized: &Currency::MAJORS,
    pair: PairPosition::First,
    duplicates: DuplicatePolicy::LastWins,
    order: OutputOrder::Majors,
};

impl BankProfile {
    pub fn hamkorbank() -> Self {
        Self {
            id: "hamkorbank",
            bank: "Hamkorbank",
            urls: urls(&[
                "https://hamkorbank.uz/ru/exchange-rate/",
                "https://hamkorbank.uz/en/exchange-rate/",
            ]),
            // scans every listed currency, reports only the majors
            rules: ScanRules {
                scope: RowScope::TableRows,
                recognized: &Currency::ALL,
                pair: PairPosition::Last,
                duplicates: DuplicatePolicy::LastWins,
                order: OutputOrder::Majors,
            },
        }
    }

    pub fn agrobank() -> Self {
        Self {
            id: "agrobank",
            bank: "Agrobank",
            urls: urls(&[
                "https://agrobank.uz/ru/person",
                "https://agrobank.uz/ru/individuals",
                "https://agrobank.uz/en/person",
            ]),
            rules: FIRST_PAIR_MAJORS,
        }
    }

    /// Kapitalbank repeats each currency across several table blocks
    /// (cash, cards, online), so rows are averaged rather than deduplicated.
    pub fn kapitalbank() -> Self {
        Self {
            id: "kapitalbank",
            bank: "Kapitalbank",
            urls: urls(&[
                "https://www.kapitalbank.uz/ru/services/exchange-rates-new/",
                "https://www.kapitalbank.uz/ru/services/exchange-rates/",
                "https://www.kapitalbank.uz/en/services/exchange-rates-new/",
                "https://www.kapitalbank.uz/services/exchange-rates-new/",
            ]),
            rules: ScanRules {
                scope: RowScope::AnyRow,
                recognized: &Currency::MAJORS,
                pair: PairPosition::Last,
                duplicates: DuplicatePolicy::Average,
                order: OutputOrder::Alphabetical,
            },
        }
    }

    pub fn ipakyulibank() -> Self {
        Self {
            id: "ipakyulibank",
            bank: "Ipak Yuli Bank",
            urls: urls(&[
                "https://ipakyulibank.uz/ru",
                "https://ipakyulibank.uz/ru/exchange-rates",
                "https://ipakyulibank.uz/ru/individuals/exchange-rates",
                "https://ipakyulibank.uz/en",
            ]),
            rules: FIRST_PAIR_MAJORS,
        }
    }

    pub fn tbcbank() -> Self {
        Self {
            id: "tbcbank",
            bank: "TBC Bank Uzbekistan",
            urls: urls(&["https://tbcbank.uz/ru", "https://tbcbank.uz/en"]),
            rules: FIRST_PAIR_MAJORS,
        }
    }

    /// All supported banks, in run order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::hamkorbank(),
            Self::agrobank(),
            Self::kapitalbank(),
            Self::ipakyulibank(),
            Self::tbcbank(),
        ]
    }

    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }
}

fn urls(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|u| u.to_string()).collect()
}

/// Scrapes one bank's pages according to its [`BankProfile`].
pub struct BankAdapter {
    profile: BankProfile,
}

impl BankAdapter {
    pub fn new(profile: BankProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl RateSource for BankAdapter {
    fn id(&self) -> &str {
        self.profile.id
    }

    fn bank(&self) -> &str {
        self.profile.bank
    }

    async fn fetch_rates(&self, ctx: &RunContext) -> Result<BankRates> {
        let p = &self.profile;
        let first_url = p.urls.first()
            .ok_or_else(|| anyhow!("{}: no candidate urls configured", p.id))?;

        for url in &p.urls {
            let page = match ctx.fetcher.get_page(url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(bank = p.id, %url, error = %e, "fetch failed");
                    continue;
                }
            };

            if let Some(dir) = &ctx.debug_dir {
                match save_debug_html(dir, p.id, &page.body) {
                    Ok(path) => info!(bank = p.id, path = %path.display(), "saved debug html"),
                    Err(e) => warn!(bank = p.id, error = %e, "could not save debug html"),
                }
            }

            let report = scan_rows(&page.document(), &p.rules);
            info!(bank = p.id, %url, final_url = %page.final_url, rows = report.rows, found = report.matched, "scanned page");

            if !report.rates.is_empty() {
                return Ok(BankRates {
                    bank: p.bank.to_string(),
                    date: ctx.date,
                    rates: report.rates,
                    source_url: url.clone(),
                });
            }
        }

        Ok(BankRates::empty(p.bank, ctx.date, first_url))
    }
}

/// Adapters for every supported bank, in run order.
pub fn default_adapters() -> Vec<Box<dyn RateSource>> {
    BankProfile::all()
        .into_iter()
        .map(|p| Box::new(BankAdapter::new(p)) as Box<dyn RateSource>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_profiles_are_in_run_order() {
        let ids: Vec<_> = BankProfile::all().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["hamkorbank", "agrobank", "kapitalbank", "ipakyulibank", "tbcbank"]);
    }

    #[test]
    fn test_ids_are_alphabetic() {
        for p in BankProfile::all() {
            assert!(p.id.chars().all(char::is_alphabetic), "{}", p.id);
            assert!(!p.urls.is_empty());
        }
    }

    #[test]
    fn test_hamkorbank_reports_majors_only() {
        let html = Html::parse_document(r#"
            <table>
              <tr><td>1</td><td>USD</td><td>12 300</td><td>12 450</td></tr>
              <tr><td>2</td><td>GBP</td><td>15 300</td><td>15 900</td></tr>
              <tr><td>3</td><td>RUB</td><td>140,5</td><td>158</td></tr>
              <tr><td>4</td><td>EUR</td><td>13 000</td><td>13 400</td></tr>
            </table>
        "#);

        let report = scan_rows(&html, &BankProfile::hamkorbank().rules);
        assert_eq!(report.matched, 4);
        let codes: Vec<_> = report.rates.iter().map(|r| r.ccy).collect();
        assert_eq!(codes, vec![Currency::Usd, Currency::Eur, Currency::Rub]);
        assert_eq!(report.rates[0].buy, Some(12300.0));
        assert_eq!(report.rates[0].sell, Some(12450.0));
        assert_eq!(report.rates[2].buy, Some(140.5));
    }

    #[test]
    fn test_kapitalbank_averages_blocks() {
        let html = Html::parse_document(r#"
            <table><tr><td>EUR</td><td>100</td><td>105</td></tr>
                   <tr><td>USD</td><td>12 300</td><td>12 400</td></tr></table>
            <table><tr><td>EUR</td><td>102</td><td>107</td></tr></table>
        "#);

        let report = scan_rows(&html, &BankProfile::kapitalbank().rules);
        let codes: Vec<_> = report.rates.iter().map(|r| r.ccy).collect();
        assert_eq!(codes, vec![Currency::Eur, Currency::Usd]);
        assert_eq!(report.rates[0].buy, Some(101.0));
        assert_eq!(report.rates[0].sell, Some(106.0));
    }

    #[test]
    fn test_first_pair_banks_ignore_trailing_numbers() {
        let html = Html::parse_document(r#"
            <table><tr><td>USD</td><td>12 300</td><td>12 450</td><td>12 380 ЦБ</td></tr></table>
        "#);

        for profile in [BankProfile::agrobank(), BankProfile::ipakyulibank(), BankProfile::tbcbank()] {
            let report = scan_rows(&html, &profile.rules);
            assert_eq!(report.rates.len(), 1, "{}", profile.id);
            assert_eq!(report.rates[0].buy, Some(12300.0));
            assert_eq!(report.rates[0].sell, Some(12450.0));
        }
    }
}
