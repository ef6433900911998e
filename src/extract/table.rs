use crate::extract::numeric::parse_number;
use crate::models::{Currency, Rate};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashMap};

static ANY_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static TABLE_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("table tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());

/// Which rows of a page are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowScope {
    /// Every `<tr>` in the document.
    AnyRow,
    /// Only rows nested inside a `<table>`.
    TableRows,
}

/// Which two of a row's parsed numbers are (buy, sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairPosition {
    First,
    Last,
}

/// How repeated rows for the same currency collapse into one rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The final row found for a currency wins.
    LastWins,
    /// Buy and sell are averaged over every row, rounded to 2 decimals.
    Average,
}

/// Which currencies are emitted, and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputOrder {
    /// USD, EUR, RUB (whichever were found), nothing else.
    Majors,
    /// Every currency found, sorted by code.
    Alphabetical,
}

/// Per-bank table layout knowledge, consumed by [`scan_rows`].
#[derive(Debug, Clone, Copy)]
pub struct ScanRules {
    pub scope: RowScope,
    pub recognized: &'static [Currency],
    pub pair: PairPosition,
    pub duplicates: DuplicatePolicy,
    pub order: OutputOrder,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Rows that had at least one cell.
    pub rows: usize,
    /// Rows that yielded a currency with a buy/sell pair.
    pub matched: usize,
    pub rates: Vec<Rate>,
}

/// Scan every row of `document` and reduce the matches to one rate per currency.
pub fn scan_rows(document: &Html, rules: &ScanRules) -> ScanReport {
    let selector = match rules.scope {
        RowScope::AnyRow => &*ANY_ROW,
        RowScope::TableRows => &*TABLE_ROW,
    };

    let mut rows = 0;
    let mut pairs = Vec::new();

    for row in document.select(selector) {
        let cells = row_cells(row);
        if cells.is_empty() {
            continue;
        }
        rows += 1;

        if let Some(pair) = row_pair(&cells, rules) {
            pairs.push(pair);
        }
    }

    ScanReport {
        rows,
        matched: pairs.len(),
        rates: reduce_pairs(pairs, rules),
    }
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL)
        .map(|cell| {
            cell.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Find the row's currency and its buy/sell numbers, if it has both.
pub fn row_pair(cells: &[String], rules: &ScanRules) -> Option<(Currency, f64, f64)> {
    let ccy = cells.iter().find_map(|cell| {
        let upper = cell.to_uppercase();
        rules.recognized.iter().copied().find(|c| c.code() == upper)
    })?;

    let nums: Vec<f64> = cells.iter().filter_map(|c| parse_number(c)).collect();
    if nums.len() < 2 {
        return None;
    }

    let (buy, sell) = match rules.pair {
        PairPosition::First => (nums[0], nums[1]),
        PairPosition::Last => (nums[nums.len() - 2], nums[nums.len() - 1]),
    };
    Some((ccy, buy, sell))
}

/// Collapse row matches into the final, ordered rate list.
pub fn reduce_pairs(pairs: Vec<(Currency, f64, f64)>, rules: &ScanRules) -> Vec<Rate> {
    let mut found: HashMap<Currency, Rate> = HashMap::new();

    match rules.duplicates {
        DuplicatePolicy::LastWins => {
            for (ccy, buy, sell) in pairs {
                found.insert(ccy, Rate::new(ccy, buy, sell));
            }
        }
        DuplicatePolicy::Average => {
            let mut groups: BTreeMap<Currency, Vec<(f64, f64)>> = BTreeMap::new();
            for (ccy, buy, sell) in pairs {
                groups.entry(ccy).or_default().push((buy, sell));
            }
            for (ccy, group) in groups {
                let n = group.len() as f64;
                let buy = group.iter().map(|(b, _)| b).sum::<f64>() / n;
                let sell = group.iter().map(|(_, s)| s).sum::<f64>() / n;
                found.insert(ccy, Rate::new(ccy, round2(buy), round2(sell)));
            }
        }
    }

    match rules.order {
        OutputOrder::Majors => Currency::MAJORS
            .iter()
            .filter_map(|c| found.remove(c))
            .collect(),
        OutputOrder::Alphabetical => {
            let mut rates: Vec<Rate> = found.into_values().collect();
            rates.sort_by_key(|r| r.ccy.code());
            rates
        }
    }
}

// Exact half-cent values round to the even cent: 101.125 -> 101.12.
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}
