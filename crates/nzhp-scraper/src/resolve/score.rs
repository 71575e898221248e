//! Candidate scoring for address search results.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::address::ParsedAddress;
use crate::fuzzy::partial_ratio;

static SLASH_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+[A-Za-z]?)\s*/").expect("valid unit regex"));
static PREFIX_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:unit|flat|apt|apartment)\s*(\d+[A-Za-z]?)").expect("valid unit regex")
});

/// Cities and regions recognized in candidate text.
const NZ_REGIONS: &[&str] = &[
    "auckland",
    "wellington",
    "christchurch",
    "hamilton",
    "tauranga",
    "dunedin",
    "napier",
    "hastings",
    "nelson",
    "rotorua",
    "new plymouth",
    "whangarei",
    "invercargill",
    "palmerston north",
    "queenstown",
    "gisborne",
    "timaru",
    "whanganui",
    "blenheim",
    "canterbury",
    "otago",
    "waikato",
    "northland",
    "southland",
    "taranaki",
    "bay of plenty",
    "hawke's bay",
    "manawatu",
    "marlborough",
    "tasman",
    "west coast",
];

const UNIT_MATCH: i64 = 100;
const UNIT_MISMATCH: i64 = -50;
const UNIT_MISSING: i64 = -10;
const SHARED_TOKEN: i64 = 10;
const LEADING_TOKEN: i64 = 50;
const LOCATION_CONFLICT: i64 = -200;
const SUBURB_MATCH: i64 = 100;
const CITY_MATCH: i64 = 50;

/// Unit designator at the start of an address (`3/14 ...`, `Unit 5 ...`).
#[must_use]
pub fn extract_unit(address: &str) -> Option<String> {
    let address = address.trim();
    SLASH_UNIT
        .captures(address)
        .or_else(|| PREFIX_UNIT.captures(address))
        .map(|caps| caps[1].to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateScore {
    pub score: i64,
    /// `false` when the candidate names a conflicting region and matches
    /// neither the target's suburb nor city.
    pub location_match: bool,
}

/// Scores how well `candidate` text matches the `target` address.
///
/// `parsed` is `target` already parsed; `location_threshold` is the fuzzy
/// partial-ratio (0-100) at which two place names count as the same.
#[must_use]
pub fn score_candidate(
    target: &str,
    parsed: &ParsedAddress,
    candidate: &str,
    location_threshold: u8,
) -> CandidateScore {
    let target_lower = target.trim().to_lowercase();
    let candidate_lower = candidate.trim().to_lowercase();
    let mut score = 0i64;

    match (extract_unit(target), extract_unit(candidate)) {
        (Some(want), Some(got)) if want.eq_ignore_ascii_case(&got) => score += UNIT_MATCH,
        (Some(_), Some(_)) => score += UNIT_MISMATCH,
        (Some(_), None) => score += UNIT_MISSING,
        (None, _) => {}
    }

    let target_words: HashSet<&str> = target_lower.split_whitespace().collect();
    let candidate_words: HashSet<&str> = candidate_lower.split_whitespace().collect();
    let shared = target_words.intersection(&candidate_words).count();
    score += i64::try_from(shared).unwrap_or(i64::MAX / SHARED_TOKEN) * SHARED_TOKEN;

    if let Some(first) = target_lower.split_whitespace().next() {
        if candidate_lower.starts_with(first) {
            score += LEADING_TOKEN;
        }
    }

    let places = |name: &str| !name.is_empty() && partial_ratio(name, candidate) >= location_threshold;
    let suburb_match = places(&parsed.suburb);
    let city_match = places(&parsed.city);

    let conflict = region_conflict(parsed, &candidate_lower, location_threshold);
    let location_match = !(conflict && !suburb_match && !city_match);
    if !location_match {
        score += LOCATION_CONFLICT;
    }
    if suburb_match {
        score += SUBURB_MATCH;
    }
    if city_match {
        score += CITY_MATCH;
    }

    CandidateScore {
        score,
        location_match,
    }
}

/// A recognized region in the candidate that is unrelated to the target's
/// suburb and city.
fn region_conflict(parsed: &ParsedAddress, candidate_lower: &str, threshold: u8) -> bool {
    let known: Vec<&str> = [parsed.suburb.as_str(), parsed.city.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if known.is_empty() {
        return false;
    }

    NZ_REGIONS
        .iter()
        .filter(|region| contains_phrase(candidate_lower, region))
        .any(|region| !known.iter().any(|place| partial_ratio(place, region) >= threshold))
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Word-overlap confidence: the share of `search` words found in `result`,
/// capped at 0.99 unless the strings are identical ignoring case.
#[must_use]
pub fn calculate_confidence(search: &str, result: &str) -> f64 {
    let search_lower = search.to_lowercase();
    let result_lower = result.to_lowercase();
    if search_lower == result_lower {
        return 1.0;
    }

    let search_words: HashSet<&str> = search_lower.split_whitespace().collect();
    if search_words.is_empty() {
        return 0.0;
    }
    let result_words: HashSet<&str> = result_lower.split_whitespace().collect();
    let overlap = search_words.intersection(&result_words).count();

    #[allow(clippy::cast_precision_loss)]
    let confidence = overlap as f64 / search_words.len() as f64;
    confidence.min(0.99)
}

#[cfg(test)]
#[path = "score_test.rs"]
mod tests;
