//! Cascading field extraction.
//!
//! A price point is located by trying an ordered list of strategies (precise
//! structural selectors first, regex over the whole page last) until one
//! yields non-empty text. Extraction never fails: a strategy that errors or
//! times out simply misses. Logging happens through [`CascadeObserver`], not
//! here.

pub mod table;

use std::time::Duration;

use nzhp_core::{PricePoint, ScrapingResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::session::BrowserSession;

pub use table::{SelectorTable, SelectorTableError};

/// How a strategy locates its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Css,
    Xpath,
    TextPattern,
    RegexFallback,
}

impl StrategyKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Css => "css",
            StrategyKind::Xpath => "xpath",
            StrategyKind::TextPattern => "text_pattern",
            StrategyKind::RegexFallback => "regex_fallback",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One way to locate a price on a page. Patterns are compiled when the
/// selector table is loaded.
#[derive(Debug, Clone)]
pub enum SelectorStrategy {
    Css(String),
    Xpath(String),
    /// Contextual pattern; capture group 1 is the price when present.
    TextPattern(Regex),
    /// Last-resort pattern over the full page text.
    RegexFallback(Regex),
}

impl SelectorStrategy {
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            SelectorStrategy::Css(_) => StrategyKind::Css,
            SelectorStrategy::Xpath(_) => StrategyKind::Xpath,
            SelectorStrategy::TextPattern(_) => StrategyKind::TextPattern,
            SelectorStrategy::RegexFallback(_) => StrategyKind::RegexFallback,
        }
    }

    /// The selector or pattern source.
    #[must_use]
    pub fn describe(&self) -> &str {
        match self {
            SelectorStrategy::Css(s) | SelectorStrategy::Xpath(s) => s,
            SelectorStrategy::TextPattern(re) | SelectorStrategy::RegexFallback(re) => re.as_str(),
        }
    }
}

/// Applies one strategy to the session's current page.
///
/// Returns the trimmed text found, or `None` when nothing matched, the
/// session errored, or the step exceeded `step_timeout`.
pub async fn apply<S: BrowserSession>(
    session: &S,
    strategy: &SelectorStrategy,
    step_timeout: Duration,
) -> Option<String> {
    let lookup = async {
        match strategy {
            SelectorStrategy::Css(selector) => session.find_by_css(selector).await,
            SelectorStrategy::Xpath(selector) => session.find_by_xpath(selector).await,
            SelectorStrategy::TextPattern(re) | SelectorStrategy::RegexFallback(re) => session
                .full_page_text()
                .await
                .map(|text| first_pattern_match(re, &text)),
        }
    };

    match tokio::time::timeout(step_timeout, lookup).await {
        Ok(Ok(found)) => found.map(|text| text.trim().to_string()),
        Ok(Err(_)) | Err(_) => None,
    }
}

fn first_pattern_match(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().to_string())
}

/// What happened on one cascade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome<'a> {
    Miss,
    Hit { raw: &'a str },
    Rejected { raw: &'a str, reason: &'a str },
}

/// Hooks for tracing extraction without coupling it to a logger.
///
/// All methods default to doing nothing.
pub trait CascadeObserver: Send + Sync {
    fn on_attempt(
        &self,
        _site: &str,
        _point: PricePoint,
        _strategy: &SelectorStrategy,
        _outcome: AttemptOutcome<'_>,
    ) {
    }

    fn on_price(&self, _site: &str, _point: PricePoint, _raw: &str, _value: f64, _kind: StrategyKind) {}

    fn on_result(&self, _result: &ScrapingResult) {}
}

/// Discards every event; selected when logging is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CascadeObserver for NoopObserver {}

/// Emits cascade events as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CascadeObserver for TracingObserver {
    fn on_attempt(
        &self,
        site: &str,
        point: PricePoint,
        strategy: &SelectorStrategy,
        outcome: AttemptOutcome<'_>,
    ) {
        let kind = strategy.kind();
        match outcome {
            AttemptOutcome::Miss => tracing::debug!(
                site,
                price_point = %point,
                strategy = %kind,
                selector = strategy.describe(),
                "strategy found nothing"
            ),
            AttemptOutcome::Hit { raw } => tracing::debug!(
                site,
                price_point = %point,
                strategy = %kind,
                raw,
                "strategy matched"
            ),
            AttemptOutcome::Rejected { raw, reason } => tracing::debug!(
                site,
                price_point = %point,
                strategy = %kind,
                raw,
                reason,
                "strategy match rejected"
            ),
        }
    }

    fn on_price(&self, site: &str, point: PricePoint, raw: &str, value: f64, kind: StrategyKind) {
        tracing::info!(site, price_point = %point, strategy = %kind, raw, value, "price extracted");
    }

    fn on_result(&self, result: &ScrapingResult) {
        if result.success {
            tracing::info!(
                site = %result.site,
                url = %result.url,
                method = %result.extraction_method,
                execution_time = result.execution_time,
                "site scraped"
            );
        } else {
            tracing::warn!(
                site = %result.site,
                url = %result.url,
                errors = ?result.errors,
                "site scrape failed"
            );
        }
    }
}

/// Per-cascade context passed to observers.
#[derive(Clone, Copy)]
pub struct CascadeContext<'a> {
    pub site: &'a str,
    pub point: PricePoint,
    pub step_timeout: Duration,
    pub observer: &'a dyn CascadeObserver,
}

/// The accepted result of a cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeHit<T> {
    pub value: T,
    /// Text as found on the page.
    pub raw: String,
    pub kind: StrategyKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CascadeOutcome<T> {
    pub hit: Option<CascadeHit<T>>,
    /// Reasons given by `accept` for every rejected match, in order.
    pub rejections: Vec<String>,
}

/// First non-empty strategy result in list order, with its strategy kind.
pub async fn apply_cascade<S: BrowserSession>(
    session: &S,
    strategies: &[SelectorStrategy],
    ctx: &CascadeContext<'_>,
) -> Option<(String, StrategyKind)> {
    apply_cascade_with(session, strategies, ctx, |raw| Ok::<_, String>(raw.to_string()))
        .await
        .hit
        .map(|hit| (hit.raw, hit.kind))
}

/// Like [`apply_cascade`], but a match must also pass `accept`.
///
/// A rejected match is recorded and the cascade moves on to the next
/// strategy.
pub async fn apply_cascade_with<S, T, F>(
    session: &S,
    strategies: &[SelectorStrategy],
    ctx: &CascadeContext<'_>,
    mut accept: F,
) -> CascadeOutcome<T>
where
    S: BrowserSession,
    F: FnMut(&str) -> Result<T, String>,
{
    let mut rejections = Vec::new();

    for strategy in strategies {
        let Some(raw) = apply(session, strategy, ctx.step_timeout)
            .await
            .filter(|text| !text.is_empty())
        else {
            ctx.observer
                .on_attempt(ctx.site, ctx.point, strategy, AttemptOutcome::Miss);
            continue;
        };

        match accept(&raw) {
            Ok(value) => {
                ctx.observer
                    .on_attempt(ctx.site, ctx.point, strategy, AttemptOutcome::Hit { raw: &raw });
                return CascadeOutcome {
                    hit: Some(CascadeHit {
                        value,
                        raw,
                        kind: strategy.kind(),
                    }),
                    rejections,
                };
            }
            Err(reason) => {
                ctx.observer.on_attempt(
                    ctx.site,
                    ctx.point,
                    strategy,
                    AttemptOutcome::Rejected {
                        raw: &raw,
                        reason: &reason,
                    },
                );
                rejections.push(reason);
            }
        }
    }

    CascadeOutcome {
        hit: None,
        rejections,
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
