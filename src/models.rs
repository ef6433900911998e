use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Currency codes a bank page may quote against the sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Rub,
    Gbp,
    Jpy,
    Chf,
    Try,
    Cny,
    Kzt,
}

impl Currency {
    pub const ALL: [Currency; 9] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Rub,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Chf,
        Currency::Try,
        Currency::Cny,
        Currency::Kzt,
    ];

    /// The currencies every adapter reports, in output order.
    pub const MAJORS: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Rub];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Rub => "RUB",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Chf => "CHF",
            Currency::Try => "TRY",
            Currency::Cny => "CNY",
            Currency::Kzt => "KZT",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Rate {
    pub ccy: Currency,
    pub buy: Option<f64>,
    pub sell: Option<f64>,
}

impl Rate {
    pub fn new(ccy: Currency, buy: f64, sell: f64) -> Self {
        Self { ccy, buy: Some(buy), sell: Some(sell) }
    }
}

/// One bank's result for a run. Serialized as-is into `rates.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BankRates {
    pub bank: String,
    pub date: NaiveDate,
    pub rates: Vec<Rate>,
    pub source_url: String,
}

impl BankRates {
    pub fn empty(bank: &str, date: NaiveDate, source_url: &str) -> Self {
        Self {
            bank: bank.to_string(),
            date,
            rates: Vec::new(),
            source_url: source_url.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
