//! Turning scraped page text into rates.
//!
//! `numeric` coerces loosely formatted cell text into numbers, `table` scans
//! table rows and reduces them into one buy/sell pair per currency.

pub mod numeric;
pub mod table;

pub use numeric::parse_number;
pub use table::{scan_rows, DuplicatePolicy, OutputOrder, PairPosition, RowScope, ScanReport, ScanRules};
