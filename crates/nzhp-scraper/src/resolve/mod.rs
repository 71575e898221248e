//! Address resolution: find a site's property page for a freeform address.

mod cache;
mod score;
mod surface;

use std::cmp::Ordering;
use std::collections::HashSet;

use nzhp_core::{AppConfig, MatchInfo, SearchResult, SiteId};

use crate::address::{abbreviate_street_type, normalize_address, parse_address, ParsedAddress};
use crate::error::SessionError;
use crate::session::{BrowserSession, PageLink};

pub use cache::UrlCache;
pub use score::{calculate_confidence, extract_unit, score_candidate, CandidateScore};
pub use surface::SearchSurface;

/// Thresholds for accepting a resolved URL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    /// The top result's confidence must exceed this for a URL to be returned.
    pub url_confidence_threshold: f64,
    /// Fuzzy partial-ratio (0-100) at which place names are considered equal.
    pub location_match_threshold: u8,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            url_confidence_threshold: 0.5,
            location_match_threshold: 70,
        }
    }
}

impl ResolverSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            url_confidence_threshold: config.url_confidence_threshold,
            location_match_threshold: config.location_match_threshold,
        }
    }
}

/// Queries to try in order: the full address, then with trailing comma
/// segments dropped one at a time, then the street with its type
/// abbreviated.
#[must_use]
pub fn search_queries(normalized: &str) -> Vec<String> {
    let parts: Vec<&str> = normalized
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let mut queries: Vec<String> = (1..=parts.len())
        .rev()
        .map(|n| parts[..n].join(", "))
        .collect();
    if let Some(short) = parts.first().and_then(|street| abbreviate_street_type(street)) {
        queries.push(short);
    }
    let mut seen = HashSet::new();
    queries.retain(|q| seen.insert(q.clone()));
    queries
}

/// Resolves addresses on one site through an injected session.
pub struct PropertyResolver<'a, S> {
    session: &'a S,
    surface: SearchSurface,
    settings: ResolverSettings,
}

impl<'a, S: BrowserSession> PropertyResolver<'a, S> {
    #[must_use]
    pub fn new(site: SiteId, session: &'a S, settings: ResolverSettings) -> Self {
        Self::with_surface(SearchSurface::for_site(site), session, settings)
    }

    /// Resolver for a site given by domain name; `None` for unsupported sites.
    #[must_use]
    pub fn for_site_name(name: &str, session: &'a S, settings: ResolverSettings) -> Option<Self> {
        SiteId::from_name(name).map(|site| Self::new(site, session, settings))
    }

    #[must_use]
    pub fn with_surface(surface: SearchSurface, session: &'a S, settings: ResolverSettings) -> Self {
        Self {
            session,
            surface,
            settings,
        }
    }

    #[must_use]
    pub fn site(&self) -> SiteId {
        self.surface.site
    }

    /// Searches the site and returns scored candidates, best first.
    ///
    /// Broadens the query until some candidate appears; an empty list means
    /// nothing was found at all.
    ///
    /// # Errors
    ///
    /// Propagates session failures from submitting the search or reading
    /// the results.
    pub async fn search_property(&self, address: &str) -> Result<Vec<SearchResult>, SessionError> {
        let normalized = normalize_address(address);
        let parsed = parse_address(&normalized);
        let site = self.site().domain();

        for query in search_queries(&normalized) {
            self.session.submit_search(&self.surface, &query).await?;
            let links = self.session.find_links(&self.surface.link_selector).await?;
            let ranked = self.rank(&links, &normalized, &parsed);
            if !ranked.is_empty() {
                tracing::debug!(site, query = %query, candidates = ranked.len(), "search matched");
                return Ok(ranked);
            }
            tracing::debug!(site, query = %query, "no candidates, broadening search");
        }

        Ok(Vec::new())
    }

    /// URL of the best candidate when its confidence clears the threshold.
    ///
    /// # Errors
    ///
    /// See [`PropertyResolver::search_property`].
    pub async fn get_property_url(&self, address: &str) -> Result<Option<String>, SessionError> {
        let results = self.search_property(address).await?;
        let best = results
            .into_iter()
            .next()
            .filter(|r| r.confidence > self.settings.url_confidence_threshold);
        if best.is_none() {
            tracing::info!(site = self.site().domain(), address, "no confident match");
        }
        Ok(best.map(|r| r.url))
    }

    fn rank(&self, links: &[PageLink], target: &str, parsed: &ParsedAddress) -> Vec<SearchResult> {
        let mut seen = HashSet::new();
        let mut scored: Vec<(i64, SearchResult)> = links
            .iter()
            .filter(|link| link.href.contains(&self.surface.href_marker))
            .filter(|link| seen.insert(link.href.clone()))
            .filter_map(|link| {
                let text = link.text.lines().next().map(str::trim).unwrap_or_default();
                if text.is_empty() {
                    return None;
                }
                let CandidateScore {
                    score,
                    location_match,
                } = score_candidate(
                    target,
                    parsed,
                    text,
                    self.settings.location_match_threshold,
                );
                let confidence = if location_match {
                    calculate_confidence(target, text)
                } else {
                    0.0
                };
                Some((
                    score,
                    SearchResult {
                        address: text.to_string(),
                        url: link.href.clone(),
                        confidence,
                        site: self.site().domain().to_string(),
                        extra_info: Some(MatchInfo {
                            score,
                            location_match,
                        }),
                    },
                ))
            })
            .collect();

        scored.sort_by(|(sa, ra), (sb, rb)| {
            sb.cmp(sa).then_with(|| {
                rb.confidence
                    .partial_cmp(&ra.confidence)
                    .unwrap_or(Ordering::Equal)
            })
        });
        scored.into_iter().map(|(_, result)| result).collect()
    }
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
