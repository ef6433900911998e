use once_cell::sync::Lazy;
use regex::Regex;

static WHOLE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());
// digits, optional space-grouped thousands, a decimal separator and more digits
static EMBEDDED_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d[\d\s]*[.,]\d+|\d+)").unwrap());

/// Parse a table cell into a number.
///
/// Bank cells mix symbols, units and captions with the value ("1 234,50 сум"),
/// so the whole cell is tried first and the first number-looking run second.
pub fn parse_number(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return None;
    }

    let compact = cell
        .trim()
        .replace('\u{a0}', " ")
        .replace(' ', "")
        .replace(',', ".");

    let candidate = if WHOLE_NUMBER.is_match(&compact) {
        compact
    } else {
        let found = EMBEDDED_NUMBER.captures(&compact)?.get(1)?;
        found.as_str().replace(' ', "").replace(',', ".")
    };

    candidate.parse::<f64>().ok()
}
