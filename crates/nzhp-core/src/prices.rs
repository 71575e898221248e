//! Price-point, extraction, and resolution records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sites::SiteId;

/// One of the three valuation bounds a site may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricePoint {
    Lower,
    Midpoint,
    Upper,
}

impl PricePoint {
    /// Order in which price points are extracted from a page.
    pub const EXTRACTION_ORDER: [PricePoint; 3] =
        [PricePoint::Midpoint, PricePoint::Upper, PricePoint::Lower];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PricePoint::Lower => "lower",
            PricePoint::Midpoint => "midpoint",
            PricePoint::Upper => "upper",
        }
    }
}

impl std::fmt::Display for PricePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower/midpoint/upper valuation bounds; any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    pub lower: Option<f64>,
    pub midpoint: Option<f64>,
    pub upper: Option<f64>,
}

impl Prices {
    #[must_use]
    pub fn get(&self, point: PricePoint) -> Option<f64> {
        match point {
            PricePoint::Lower => self.lower,
            PricePoint::Midpoint => self.midpoint,
            PricePoint::Upper => self.upper,
        }
    }

    pub fn set(&mut self, point: PricePoint, value: Option<f64>) {
        match point {
            PricePoint::Lower => self.lower = value,
            PricePoint::Midpoint => self.midpoint = value,
            PricePoint::Upper => self.upper = value,
        }
    }

    /// Number of bounds that are present.
    #[must_use]
    pub fn present_count(&self) -> usize {
        [self.lower, self.midpoint, self.upper]
            .iter()
            .filter(|p| p.is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }
}

/// Outcome of validating one extracted price string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub value: Option<f64>,
    pub error_message: String,
}

impl ValidationResult {
    #[must_use]
    pub fn valid(value: f64) -> Self {
        Self {
            is_valid: true,
            value: Some(value),
            error_message: String::new(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            value: None,
            error_message: message.into(),
        }
    }
}

/// The per-site, per-run extraction record consumed by aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingResult {
    /// Site domain, or `"unknown"` when the URL matched no site.
    pub site: String,
    pub url: String,
    /// `true` when at least one price point was extracted.
    pub success: bool,
    pub prices: Prices,
    pub errors: Vec<String>,
    /// Comma-joined `"<price_point>:<strategy_type>"` entries.
    pub extraction_method: String,
    /// Wall-clock seconds spent on this site.
    pub execution_time: f64,
}

impl ScrapingResult {
    /// A result for a site that produced nothing usable.
    #[must_use]
    pub fn failed(site: impl Into<String>, url: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            site: site.into(),
            url: url.into(),
            success: false,
            prices: Prices::default(),
            errors,
            extraction_method: "none".to_string(),
            execution_time: 0.0,
        }
    }
}

/// One candidate produced while resolving an address on a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub address: String,
    pub url: String,
    /// Match likelihood in `[0, 1]`.
    pub confidence: f64,
    pub site: String,
    pub extra_info: Option<MatchInfo>,
}

/// Scoring details attached to a [`SearchResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    /// Raw heuristic score used for ranking.
    pub score: i64,
    /// `false` when the candidate sits in a different suburb or city.
    pub location_match: bool,
}

/// A successful site's bounds, ready for aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub source: String,
    pub lower: Option<f64>,
    pub midpoint: Option<f64>,
    pub upper: Option<f64>,
    /// `false` for sites that never publish a midpoint.
    pub midpoint_published: bool,
    pub scraped_at: DateTime<Utc>,
}

impl PriceEstimate {
    #[must_use]
    pub fn new(source: impl Into<String>, prices: Prices) -> Self {
        Self {
            source: source.into(),
            lower: prices.lower,
            midpoint: prices.midpoint,
            upper: prices.upper,
            midpoint_published: true,
            scraped_at: Utc::now(),
        }
    }

    /// Builds an estimate from a scrape, or `None` if the scrape failed.
    #[must_use]
    pub fn from_scraping_result(result: &ScrapingResult) -> Option<Self> {
        if !result.success {
            return None;
        }
        let midpoint_published = SiteId::from_name(&result.site)
            .is_none_or(SiteId::publishes_midpoint);
        Some(Self {
            midpoint_published,
            ..Self::new(result.site.clone(), result.prices)
        })
    }

    #[must_use]
    pub fn has_range(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    #[must_use]
    pub fn prices(&self) -> Prices {
        Prices {
            lower: self.lower,
            midpoint: self.midpoint,
            upper: self.upper,
        }
    }
}
