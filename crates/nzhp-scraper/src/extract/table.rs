//! The per-site, per-price-point strategy table.
//!
//! Loaded once from YAML and then read-only. A built-in table is embedded in
//! the crate; a file can replace it wholesale.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use nzhp_core::{PricePoint, SiteId};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::{SelectorStrategy, StrategyKind};

const BUILTIN_TABLE: &str = include_str!("../../data/selectors.yaml");

#[derive(Debug, Error)]
pub enum SelectorTableError {
    #[error("failed to read selector table {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse selector table: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unknown site in selector table: {0}")]
    UnknownSite(String),

    #[error("no strategies listed for {site} {point}")]
    EmptyStrategies { site: SiteId, point: PricePoint },

    #[error("{site} {point} strategy #{index} ({kind}) has no {field}")]
    MissingField {
        site: SiteId,
        point: PricePoint,
        index: usize,
        kind: StrategyKind,
        field: &'static str,
    },

    #[error("invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid CSS selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStrategy {
    #[serde(rename = "type")]
    kind: StrategyKind,
    #[serde(default)]
    selector: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
}

type RawTable = BTreeMap<String, HashMap<PricePoint, Vec<RawStrategy>>>;

/// Immutable map of (site, price point) to ordered strategies.
#[derive(Debug, Clone, Default)]
pub struct SelectorTable {
    entries: HashMap<(SiteId, PricePoint), Vec<SelectorStrategy>>,
}

impl SelectorTable {
    /// The table shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorTableError`] if the embedded table is malformed.
    pub fn builtin() -> Result<Self, SelectorTableError> {
        Self::from_yaml_str(BUILTIN_TABLE)
    }

    /// Reads a table from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorTableError`] if the file cannot be read, parsed, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, SelectorTableError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SelectorTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// `path` when configured, otherwise the built-in table.
    ///
    /// # Errors
    ///
    /// See [`SelectorTable::load`].
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, SelectorTableError> {
        match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading selector table override");
                Self::load(path)
            }
            None => Self::builtin(),
        }
    }

    /// Parses and validates a YAML table.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorTableError`] on malformed YAML, unknown sites, empty
    /// strategy lists, missing selector/pattern fields, and patterns or CSS
    /// selectors that do not compile.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SelectorTableError> {
        let raw: RawTable = serde_yaml::from_str(yaml)?;
        let mut entries = HashMap::new();

        for (site_name, points) in raw {
            let site = SiteId::from_name(&site_name)
                .ok_or_else(|| SelectorTableError::UnknownSite(site_name.clone()))?;
            for (point, raw_strategies) in points {
                if raw_strategies.is_empty() {
                    return Err(SelectorTableError::EmptyStrategies { site, point });
                }
                let strategies = raw_strategies
                    .into_iter()
                    .enumerate()
                    .map(|(index, raw)| compile_strategy(site, point, index, raw))
                    .collect::<Result<Vec<_>, _>>()?;
                entries.insert((site, point), strategies);
            }
        }

        Ok(Self { entries })
    }

    /// Strategies for a site's price point, in priority order. Empty when the
    /// table has none.
    #[must_use]
    pub fn strategies(&self, site: SiteId, point: PricePoint) -> &[SelectorStrategy] {
        self.entries
            .get(&(site, point))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any price point is configured for `site`.
    #[must_use]
    pub fn covers(&self, site: SiteId) -> bool {
        self.entries.keys().any(|(s, _)| *s == site)
    }
}

fn compile_strategy(
    site: SiteId,
    point: PricePoint,
    index: usize,
    raw: RawStrategy,
) -> Result<SelectorStrategy, SelectorTableError> {
    let missing = |field| SelectorTableError::MissingField {
        site,
        point,
        index,
        kind: raw.kind,
        field,
    };

    match raw.kind {
        StrategyKind::Css => {
            let selector = non_empty(raw.selector).ok_or_else(|| missing("selector"))?;
            scraper::Selector::parse(&selector).map_err(|e| SelectorTableError::InvalidSelector {
                selector: selector.clone(),
                reason: format!("{e:?}"),
            })?;
            Ok(SelectorStrategy::Css(selector))
        }
        StrategyKind::Xpath => {
            let selector = non_empty(raw.selector).ok_or_else(|| missing("selector"))?;
            Ok(SelectorStrategy::Xpath(selector))
        }
        StrategyKind::TextPattern => {
            let pattern = non_empty(raw.pattern).ok_or_else(|| missing("pattern"))?;
            Ok(SelectorStrategy::TextPattern(compile(&pattern)?))
        }
        StrategyKind::RegexFallback => {
            let pattern = non_empty(raw.pattern).ok_or_else(|| missing("pattern"))?;
            Ok(SelectorStrategy::RegexFallback(compile(&pattern)?))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn compile(pattern: &str) -> Result<Regex, SelectorTableError> {
    Regex::new(pattern).map_err(|source| SelectorTableError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
