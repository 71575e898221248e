//! Price text conversion and validation.
//!
//! Raw strings pulled off a page (`"$1.2M"`, `"QV: $850,000"`, `"$ 1.2 M"`)
//! are stripped of site idioms, converted to a number, and optionally checked
//! against a plausible house-price range.

use std::sync::LazyLock;

use nzhp_core::{SiteId, ValidationResult};
use regex::Regex;
use thiserror::Error;

pub const DEFAULT_MIN_PRICE: f64 = 100_000.0;
pub const DEFAULT_MAX_PRICE: f64 = 50_000_000.0;

/// Textual shapes accepted by [`PriceValidator::validate_price`].
static ACCEPTED_SHAPES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^\$?[\d,]+\.?\d*[MKmk]?$").expect("valid price shape regex"),
        Regex::new(r"^\d+\.?\d*$").expect("valid numeric shape regex"),
    ]
});

/// Price-like tokens: suffixed (`$1.2M`, `$850K`) or plain (`$1,200,000.50`).
static PRICE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\d+(?:\.\d+)?[MK]|\d(?:[\d,]*\d)?(?:\.\d+)?)").expect("valid price regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("empty price text")]
    Empty,

    #[error("not a decimal number: \"{0}\"")]
    NotDecimal(String),
}

/// Converts price text to a number.
///
/// Strips `$`, thousands separators and surrounding whitespace, then applies
/// a case-insensitive `M` (millions) or `K` (thousands) suffix. The remainder
/// must be plain decimal digits with at most one decimal point, so `inf`,
/// `NaN` and exponent forms are rejected.
///
/// # Errors
///
/// Returns [`ConversionError`] if the text is empty or not a decimal number.
pub fn convert_to_numeric(text: &str) -> Result<f64, ConversionError> {
    let cleaned: String = text.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(ConversionError::Empty);
    }

    let (number, multiplier) = match cleaned.chars().last() {
        Some('M' | 'm') => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        Some('K' | 'k') => (&cleaned[..cleaned.len() - 1], 1_000.0),
        _ => (cleaned, 1.0),
    };

    if !is_plain_decimal(number) {
        return Err(ConversionError::NotDecimal(text.to_string()));
    }

    number
        .parse::<f64>()
        .map(|n| n * multiplier)
        .map_err(|_| ConversionError::NotDecimal(text.to_string()))
}

fn is_plain_decimal(s: &str) -> bool {
    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in s.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

/// Formats a price the way sites display it: `$1,234,567`, or with two
/// decimals when the value is fractional.
#[must_use]
pub fn format_price(value: f64) -> String {
    let cents = (value.abs() * 100.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cents = cents as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    if frac == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{frac:02}")
    }
}

/// Distinct price-like strings on a page, in order of first appearance.
///
/// A token immediately followed by another digit is ignored.
#[must_use]
pub fn find_prices_with_regex(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in PRICE_TOKEN.find_iter(text) {
        let followed_by_digit = text[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        if followed_by_digit {
            continue;
        }
        let token = m.as_str();
        if !found.iter().any(|f| f == token) {
            found.push(token.to_string());
        }
    }
    found
}

/// Removes a site's display idioms so the generic converter can read the text.
///
/// Unknown sites get the text back trimmed.
#[must_use]
pub fn strip_site_idioms(site: &str, text: &str) -> String {
    match SiteId::from_name(site) {
        Some(SiteId::Qv) => {
            let trimmed = text.trim();
            let without_prefix = trimmed
                .get(..3)
                .filter(|p| p.eq_ignore_ascii_case("qv:"))
                .map_or(trimmed, |_| &trimmed[3..]);
            remove_whitespace(without_prefix)
        }
        Some(SiteId::Homes | SiteId::PropertyValue | SiteId::RealEstate | SiteId::OneRoof) => {
            remove_whitespace(text)
        }
        None => text.trim().to_string(),
    }
}

fn remove_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Site-aware conversion: strips the site's idioms, then converts.
///
/// # Errors
///
/// Returns [`ConversionError`] if the stripped text is not a price.
pub fn format_price_by_site(text: &str, site: &str) -> Result<f64, ConversionError> {
    convert_to_numeric(&strip_site_idioms(site, text))
}

/// Range and shape checks for extracted prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceValidator {
    pub min_price: f64,
    pub max_price: f64,
}

impl Default for PriceValidator {
    fn default() -> Self {
        Self {
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
        }
    }
}

impl PriceValidator {
    #[must_use]
    pub fn new(min_price: f64, max_price: f64) -> Self {
        Self {
            min_price,
            max_price,
        }
    }

    /// Validates one extracted price string.
    ///
    /// The text must match an accepted price shape, convert cleanly, and fall
    /// within `[min_price, max_price]`.
    #[must_use]
    pub fn validate_price(&self, text: Option<&str>) -> ValidationResult {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return ValidationResult::invalid("Empty or invalid price text");
        };

        if !ACCEPTED_SHAPES.iter().any(|re| re.is_match(text)) {
            return ValidationResult::invalid(format!("Price format invalid: {text}"));
        }

        match convert_to_numeric(text) {
            Ok(value) if (self.min_price..=self.max_price).contains(&value) => {
                ValidationResult::valid(value)
            }
            Ok(value) => {
                ValidationResult::invalid(format!("Price out of range: {}", format_price(value)))
            }
            Err(e) => ValidationResult::invalid(format!("Conversion error: {e}")),
        }
    }

    /// `true` when the present bounds are in non-strict ascending order.
    ///
    /// Fewer than two present values cannot be checked and pass.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn validate_price_relationships(
        &self,
        lower: Option<f64>,
        midpoint: Option<f64>,
        upper: Option<f64>,
    ) -> bool {
        let present: Vec<f64> = [lower, midpoint, upper].into_iter().flatten().collect();
        present.windows(2).all(|w| w[0] <= w[1])
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
