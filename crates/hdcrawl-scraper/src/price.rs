//! Price text normalization.
//!
//! Listing markup renders the current price as split dollar/cent spans, so the
//! collapsed text loses its decimal point (`$549` + `00` → `54900`). The last
//! two digits are always the cents.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ExtractionError;

static SAVING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(\.[0-9]{2})").expect("valid savings regex"));

/// Parses a current-price string whose last two digits are cents.
///
/// Currency symbols, thousands separators, whitespace and any decimal point
/// are discarded before the digits are read.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidPrice`] if the text contains no digits or
/// too many to represent.
pub fn parse_current_price(raw: &str) -> Result<Decimal, ExtractionError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ExtractionError::InvalidPrice {
            raw: raw.to_string(),
            reason: "no digits".to_string(),
        });
    }
    let cents: i64 = digits.parse().map_err(|_| ExtractionError::InvalidPrice {
        raw: raw.to_string(),
        reason: "amount out of range".to_string(),
    })?;
    Ok(Decimal::new(cents, 2))
}

/// Reads the first `N.NN` amount from a savings marker, `0.00` otherwise.
#[must_use]
pub fn parse_price_saving(raw: &str) -> Decimal {
    let cleaned = raw.replace(',', "");
    SAVING_RE
        .find(&cleaned)
        .and_then(|m| Decimal::from_str(m.as_str()).ok())
        .unwrap_or_else(zero)
}

/// `0.00`, scale preserved for output.
#[must_use]
pub fn zero() -> Decimal {
    Decimal::new(0, 2)
}
