//! Freeform New Zealand street address parsing and normalization.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Canonical street types and their accepted abbreviations.
///
/// The first abbreviation is the one sites display.
pub const STREET_TYPES: &[(&str, &[&str])] = &[
    ("street", &["st"]),
    ("road", &["rd"]),
    ("avenue", &["ave", "av"]),
    ("drive", &["dr"]),
    ("place", &["pl"]),
    ("crescent", &["cres", "cr"]),
    ("terrace", &["tce", "terr"]),
    ("lane", &["ln"]),
    ("court", &["ct"]),
    ("close", &["cl"]),
    ("grove", &["gr", "grv"]),
    ("parade", &["pde"]),
    ("highway", &["hwy"]),
    ("boulevard", &["blvd"]),
    ("square", &["sq"]),
    ("esplanade", &["esp"]),
    ("heights", &["hts"]),
    ("way", &["wy"]),
    ("quay", &["qy"]),
    ("glade", &["gld"]),
    ("circle", &["cir"]),
    ("mews", &[]),
    ("rise", &[]),
    ("mall", &[]),
    ("loop", &[]),
];

static UNIT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:unit|flat|apt|apartment)\.?\s*(\d+[A-Za-z]?)\s*,?\s*")
        .expect("valid unit prefix regex")
});
static UNIT_SLASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+[A-Za-z]?)\s*/\s*(.*)$").expect("valid unit slash regex")
});
static STREET_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+[A-Za-z]?)\s+(.+)$").expect("valid street number regex")
});

/// Full street type for a word (`"rd"` -> `"road"`, `"Road"` -> `"road"`).
#[must_use]
pub fn canonical_street_type(word: &str) -> Option<&'static str> {
    let word = word.trim_end_matches('.').to_ascii_lowercase();
    STREET_TYPES
        .iter()
        .find(|(full, abbrevs)| *full == word || abbrevs.contains(&word.as_str()))
        .map(|(full, _)| *full)
}

/// Display abbreviation for a street type (`"road"` -> `"rd"`).
#[must_use]
pub fn street_type_abbreviation(word: &str) -> Option<&'static str> {
    let full = canonical_street_type(word)?;
    STREET_TYPES
        .iter()
        .find(|(f, _)| *f == full)
        .and_then(|(_, abbrevs)| abbrevs.first().copied())
}

/// Components of a parsed address. Missing parts are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAddress {
    pub street_number: String,
    pub street_name: String,
    /// Canonical (unabbreviated, lowercase) street type.
    pub street_type: String,
    pub unit: String,
    pub suburb: String,
    pub city: String,
    /// Input exactly as given.
    pub raw: String,
}

impl ParsedAddress {
    /// `"unit/number name type, suburb"`, omitting empty parts.
    #[must_use]
    pub fn to_search_string(&self) -> String {
        let number = if self.unit.is_empty() {
            self.street_number.clone()
        } else if self.street_number.is_empty() {
            self.unit.clone()
        } else {
            format!("{}/{}", self.unit, self.street_number)
        };

        let street = [number.as_str(), &self.street_name, &self.street_type]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if self.suburb.is_empty() {
            street
        } else {
            format!("{street}, {}", self.suburb)
        }
    }

    /// Lowercase `number-name-type` slug of ASCII alphanumerics and hyphens.
    #[must_use]
    pub fn to_slug(&self) -> String {
        format!(
            "{} {} {}",
            self.street_number, self.street_name, self.street_type
        )
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn comma_segments(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a freeform address such as `"2/677 Worcester Street, Linwood, Christchurch"`.
///
/// Recognizes slash units (`3/14 ...`) and prefix units (`Unit 5, ...`,
/// `Flat 2A, ...`), a leading street number with optional letter suffix,
/// the street name and type, then comma-delimited suburb and city.
#[must_use]
pub fn parse_address(text: &str) -> ParsedAddress {
    let mut parsed = ParsedAddress {
        raw: text.to_string(),
        ..ParsedAddress::default()
    };

    let mut rest = collapse_whitespace(text);
    if rest.is_empty() {
        return parsed;
    }

    let prefix = UNIT_PREFIX
        .captures(&rest)
        .map(|caps| (caps[1].to_string(), caps[0].len()));
    if let Some((unit, consumed)) = prefix {
        parsed.unit = unit;
        rest = rest[consumed..].to_string();
    }

    let segments = comma_segments(&rest);
    let Some(street) = segments.first() else {
        return parsed;
    };
    let mut street = street.clone();

    let slash = UNIT_SLASH
        .captures(&street)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()));
    if let Some((unit, remainder)) = slash {
        if parsed.unit.is_empty() {
            parsed.unit = unit;
        }
        street = remainder;
    }

    let numbered = STREET_NUMBER
        .captures(&street)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()));
    let name_and_type = match numbered {
        Some((number, remainder)) => {
            parsed.street_number = number;
            remainder
        }
        None => street,
    };

    let words: Vec<&str> = name_and_type.split(' ').collect();
    match words.split_last() {
        Some((last, init)) if !init.is_empty() => {
            if let Some(full) = canonical_street_type(last) {
                parsed.street_type = full.to_string();
                parsed.street_name = init.join(" ");
            } else {
                parsed.street_name = name_and_type.clone();
            }
        }
        _ => parsed.street_name = name_and_type.clone(),
    }

    if let Some(suburb) = segments.get(1) {
        parsed.suburb.clone_from(suburb);
    }
    if let Some(city) = segments.get(2) {
        parsed.city.clone_from(city);
    }

    parsed
}

/// Collapses whitespace and expands an abbreviated street type in the first
/// comma segment, keeping the rest of the address as-is.
///
/// `"123 Example St, Ponsonby, Auckland"` -> `"123 Example Street, Ponsonby, Auckland"`
#[must_use]
pub fn normalize_address(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    let mut segments = comma_segments(&collapsed);
    if let Some(first) = segments.first_mut() {
        *first = replace_street_type(first, |word| {
            canonical_street_type(word)
                .filter(|full| !full.eq_ignore_ascii_case(word))
                .map(capitalize)
        });
    }
    segments.join(", ")
}

/// Rewrites the first comma segment with its street type abbreviated, or
/// `None` when it has no abbreviable street type.
///
/// `"66 Pacific Road"` -> `"66 Pacific Rd"`
#[must_use]
pub fn abbreviate_street_type(street: &str) -> Option<String> {
    let collapsed = collapse_whitespace(street);
    let abbreviated = replace_street_type(&collapsed, |word| {
        street_type_abbreviation(word)
            .filter(|abbr| !abbr.eq_ignore_ascii_case(word.trim_end_matches('.')))
            .map(capitalize)
    });
    (abbreviated != collapsed).then_some(abbreviated)
}

fn replace_street_type<F>(segment: &str, replace: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut words: Vec<String> = segment.split(' ').map(str::to_string).collect();
    if words.len() > 1 {
        if let Some(last) = words.last_mut() {
            if let Some(new) = replace(last) {
                *last = new;
            }
        }
    }
    words.join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "address_test.rs"]
mod tests;
