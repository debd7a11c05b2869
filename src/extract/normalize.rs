//! Text and price normalization for scraped strings.
//!
//! All functions here are total: malformed input yields `None`, never a panic
//! or an error.

use crate::extract::models::Availability;
use regex_lite::Regex;
use std::sync::LazyLock;

/// Currency marker: a symbol or a three-letter code, case-insensitive.
static CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([€$£]|EUR|USD|GBP)").unwrap());

/// First `digits[.digits]` run in the text.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap());

/// Currency assumed when a price parses but carries no marker.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Keywords that mark a card as out of stock.
const OUT_OF_STOCK_KEYWORDS: &[&str] = &["rupture", "indisponible"];

/// Collapses every whitespace run (newlines included) into one space and trims.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Parses a displayed price into `(value, currency)`.
///
/// Commas are read as decimal separators, so `"1.234,56"` yields `1.234`.
/// When a value parses but no marker is found the currency is
/// [`DEFAULT_CURRENCY`].
pub fn normalize_price(raw: Option<&str>) -> (Option<f64>, Option<String>) {
    let (value, currency) = scan_price(raw);
    match value {
        Some(v) => (Some(v), Some(currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))),
        None => (None, currency),
    }
}

/// Like [`normalize_price`] but leaves the currency `None` when no marker is present.
pub(crate) fn scan_price(raw: Option<&str>) -> (Option<f64>, Option<String>) {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return (None, None),
    };

    let text = raw.trim().replace(['\u{a0}', '\u{202f}'], " ").replace(',', ".");

    let currency = CURRENCY.captures(&text).map(|c| c[1].to_uppercase());

    let value = NUMBER.find(&text).and_then(|m| m.as_str().parse::<f64>().ok());

    (value, currency)
}

/// Classifies cleaned availability text.
pub fn classify_availability(text: Option<&str>) -> Option<Availability> {
    let text = text.filter(|t| !t.is_empty())?;
    let lower = text.to_lowercase();

    if OUT_OF_STOCK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Some(Availability::OutOfStock)
    } else {
        Some(Availability::InStock)
    }
}
