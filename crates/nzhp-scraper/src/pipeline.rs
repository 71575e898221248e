//! Batch scraping: one result per target, never aborting on a single failure.
//!
//! Sequential mode reuses one managed session behind one rate limiter, and
//! every page load (address searches included) waits on that limiter.
//! Parallel mode gives every target its own session and limiter and runs at
//! most `max_concurrent_sites` of them at once. An optional batch budget
//! abandons whatever is still running at the deadline.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use nzhp_core::{AppConfig, PricePoint, Prices, ScrapingResult, SiteId, Target};
use tokio::time::Instant;

use crate::error::{ScraperError, SessionError};
use crate::extract::{
    apply_cascade_with, CascadeContext, CascadeObserver, NoopObserver, SelectorTable,
    TracingObserver,
};
use crate::normalize::{
    find_prices_with_regex, format_price_by_site, strip_site_idioms, PriceValidator,
};
use crate::rate_limit::RateLimiter;
use crate::resolve::{PropertyResolver, ResolverSettings, SearchSurface, UrlCache};
use crate::retry::{retry_with_backoff_if, RetryPolicy};
use crate::session::{
    BrowserSession, HttpSessionFactory, ManagedSession, RateLimitedSession, SessionFactory,
};

/// Per-site scrape settings.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeOptions {
    /// Range-check prices and their ordering instead of only converting them.
    pub validate_prices: bool,
    pub validator: PriceValidator,
    /// Applied to page navigation.
    pub retry: RetryPolicy,
    pub page_load_timeout: Duration,
    pub strategy_timeout: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            validate_prices: false,
            validator: PriceValidator::default(),
            retry: RetryPolicy::default(),
            page_load_timeout: Duration::from_secs(20),
            strategy_timeout: Duration::from_secs(5),
        }
    }
}

impl ScrapeOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            validate_prices: config.validate_prices,
            validator: PriceValidator::default(),
            retry: RetryPolicy::from_config(config),
            page_load_timeout: config.page_load_timeout(),
            strategy_timeout: config.strategy_timeout(),
        }
    }
}

/// Tracing observer when logging is enabled, otherwise a no-op one.
#[must_use]
pub fn observer_for(config: &AppConfig) -> Box<dyn CascadeObserver> {
    if config.enable_logging {
        Box::new(TracingObserver)
    } else {
        Box::new(NoopObserver)
    }
}

fn finish(result: ScrapingResult, observer: &dyn CascadeObserver) -> ScrapingResult {
    observer.on_result(&result);
    result
}

/// Scrapes every price point of one property page.
///
/// Navigation is retried per `options.retry`; each price point runs its
/// strategy cascade independently, so one missing point never aborts the
/// others. A site that does not publish a midpoint has that point skipped.
pub async fn scrape_site<S: BrowserSession>(
    session: &S,
    url: &str,
    table: &SelectorTable,
    options: &ScrapeOptions,
    observer: &dyn CascadeObserver,
) -> ScrapingResult {
    let started = std::time::Instant::now();

    let Some(site) = SiteId::from_url(url).filter(|site| table.covers(*site)) else {
        let mut result = ScrapingResult::failed(
            "unknown",
            url,
            vec![format!("No selector strategies found for URL: {url}")],
        );
        result.execution_time = started.elapsed().as_secs_f64();
        return finish(result, observer);
    };
    let site_name = site.domain();

    let timeout_ms = u64::try_from(options.page_load_timeout.as_millis()).unwrap_or(u64::MAX);
    let navigation = retry_with_backoff_if(&options.retry, SessionError::is_transient, || async move {
        match tokio::time::timeout(options.page_load_timeout, session.navigate(url)).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout {
                operation: format!("page load of {url}"),
                timeout_ms,
            }),
        }
    })
    .await;
    if let Err(e) = navigation {
        let mut result =
            ScrapingResult::failed(site_name, url, vec![format!("Navigation failed: {e}")]);
        result.execution_time = started.elapsed().as_secs_f64();
        return finish(result, observer);
    }

    let mut prices = Prices::default();
    let mut errors: Vec<String> = Vec::new();
    let mut methods: Vec<String> = Vec::new();

    for point in PricePoint::EXTRACTION_ORDER {
        if point == PricePoint::Midpoint && !site.publishes_midpoint() {
            continue;
        }

        let ctx = CascadeContext {
            site: site_name,
            point,
            step_timeout: options.strategy_timeout,
            observer,
        };
        let outcome = apply_cascade_with(session, table.strategies(site, point), &ctx, |raw| {
            accept_price(site_name, point, raw, options)
        })
        .await;

        errors.extend(outcome.rejections);
        match outcome.hit {
            Some(hit) => {
                observer.on_price(site_name, point, &hit.raw, hit.value, hit.kind);
                prices.set(point, Some(hit.value));
                methods.push(format!("{point}:{}", hit.kind));
            }
            None => errors.push(format!("All strategies failed for {point}")),
        }
    }

    if options.validate_prices
        && prices.present_count() >= 2
        && !options
            .validator
            .validate_price_relationships(prices.lower, prices.midpoint, prices.upper)
    {
        errors.push("Price relationships are invalid (lower > midpoint > upper)".to_string());
    }

    let success = !prices.is_empty();
    if !success {
        if let Ok(text) = session.full_page_text().await {
            let candidates = find_prices_with_regex(&text);
            if !candidates.is_empty() {
                errors.push(format!("Price-like text on page: {}", candidates.join(", ")));
            }
        }
    }

    let result = ScrapingResult {
        site: site_name.to_string(),
        url: url.to_string(),
        success,
        prices,
        errors,
        extraction_method: methods.join(","),
        execution_time: started.elapsed().as_secs_f64(),
    };
    finish(result, observer)
}

fn accept_price(
    site: &str,
    point: PricePoint,
    raw: &str,
    options: &ScrapeOptions,
) -> Result<f64, String> {
    if options.validate_prices {
        let validation = options
            .validator
            .validate_price(Some(&strip_site_idioms(site, raw)));
        match (validation.is_valid, validation.value) {
            (true, Some(value)) => Ok(value),
            _ => Err(format!(
                "{point} validation failed: {}",
                validation.error_message
            )),
        }
    } else {
        format_price_by_site(raw, site).map_err(|e| format!("{point} extraction error: {e}"))
    }
}

/// Runs targets through sessions from `F`, resolving addresses on the way.
pub struct Pipeline<F> {
    factory: F,
    table: SelectorTable,
    options: ScrapeOptions,
    resolver: ResolverSettings,
    min_delay: Duration,
    max_delay: Duration,
    max_concurrent: usize,
    batch_budget: Option<Duration>,
    probe_timeout: Duration,
    observer: Box<dyn CascadeObserver>,
    url_cache: UrlCache,
    query_urls: HashMap<SiteId, String>,
}

impl Pipeline<HttpSessionFactory> {
    /// Static-HTML pipeline built from configuration alone: the selector
    /// table override (or the built-in table), plain HTTP sessions, and the
    /// configured observer.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::SelectorTable`] if the override file cannot
    /// be loaded.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let table = SelectorTable::load_or_builtin(config.selectors_path.as_deref())?;
        let factory = HttpSessionFactory::new(config.user_agent.clone(), config.page_load_timeout());
        Ok(Self::new(factory, table, config, observer_for(config)))
    }
}

impl<F: SessionFactory> Pipeline<F> {
    #[must_use]
    pub fn new(
        factory: F,
        table: SelectorTable,
        config: &AppConfig,
        observer: Box<dyn CascadeObserver>,
    ) -> Self {
        Self {
            factory,
            table,
            options: ScrapeOptions::from_config(config),
            resolver: ResolverSettings::from_config(config),
            min_delay: config.min_delay(),
            max_delay: config.max_delay(),
            max_concurrent: config.max_concurrent_sites.max(1),
            batch_budget: config.batch_budget(),
            probe_timeout: Duration::from_secs(5),
            observer,
            url_cache: UrlCache::new(),
            query_urls: HashMap::new(),
        }
    }

    /// Search-results URL templates (with a `{query}` placeholder) that
    /// replace the built-in search surface's for the given sites.
    #[must_use]
    pub fn with_search_urls(mut self, urls: impl IntoIterator<Item = (SiteId, String)>) -> Self {
        self.query_urls.extend(urls);
        self
    }

    /// Addresses already resolved by this pipeline.
    #[must_use]
    pub fn url_cache(&self) -> &UrlCache {
        &self.url_cache
    }

    /// Scrapes all targets, sequentially or in parallel per configuration.
    /// Results come back in target order.
    pub async fn run(&self, targets: &[Target]) -> Vec<ScrapingResult> {
        if self.max_concurrent > 1 {
            self.run_parallel(targets).await
        } else {
            self.run_sequential(targets).await
        }
    }

    /// One session, reused across targets and health-checked before each.
    pub async fn run_sequential(&self, targets: &[Target]) -> Vec<ScrapingResult> {
        let deadline = self.deadline();
        let mut managed = ManagedSession::new(&self.factory, self.options.retry, self.probe_timeout);
        let mut limiter = RateLimiter::new(self.min_delay, self.max_delay);
        let mut results = Vec::with_capacity(targets.len());

        for target in targets {
            let work = self.process(&mut managed, &mut limiter, target);
            results.push(self.within_budget(deadline, target, work).await);
        }

        if let Err(e) = managed.close().await {
            tracing::debug!(error = %e, "error closing session");
        }
        results
    }

    /// One session and rate limiter per target, bounded concurrency.
    pub async fn run_parallel(&self, targets: &[Target]) -> Vec<ScrapingResult> {
        let deadline = self.deadline();
        tracing::info!(
            targets = targets.len(),
            max_concurrent = self.max_concurrent,
            "starting parallel batch"
        );

        let mut indexed: Vec<(usize, ScrapingResult)> = stream::iter(targets.iter().enumerate())
            .map(|(index, target)| async move {
                let mut managed =
                    ManagedSession::new(&self.factory, self.options.retry, self.probe_timeout);
                let mut limiter = RateLimiter::new(self.min_delay, self.max_delay);
                let work = self.process(&mut managed, &mut limiter, target);
                let result = self.within_budget(deadline, target, work).await;
                if let Err(e) = managed.close().await {
                    tracing::debug!(error = %e, "error closing session");
                }
                (index, result)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    fn deadline(&self) -> Option<Instant> {
        self.batch_budget.map(|budget| Instant::now() + budget)
    }

    async fn within_budget<Fut>(
        &self,
        deadline: Option<Instant>,
        target: &Target,
        work: Fut,
    ) -> ScrapingResult
    where
        Fut: Future<Output = ScrapingResult>,
    {
        let Some(deadline) = deadline else {
            return work.await;
        };
        if Instant::now() >= deadline {
            return self.fail(target, "Abandoned: batch time budget exhausted".to_string());
        }
        if let Ok(result) = tokio::time::timeout_at(deadline, work).await {
            result
        } else {
            tracing::warn!(site = target.site_name(), "batch budget exhausted, abandoning target");
            self.fail(target, "Abandoned: batch time budget exhausted".to_string())
        }
    }

    async fn process<G: SessionFactory>(
        &self,
        managed: &mut ManagedSession<G>,
        limiter: &mut RateLimiter,
        target: &Target,
    ) -> ScrapingResult {
        let session = match managed.session().await {
            Ok(session) => RateLimitedSession::new(session, limiter),
            Err(e) => return self.fail(target, format!("Session unavailable: {e}")),
        };

        let url = match target {
            Target::Url { url, .. } => url.clone(),
            Target::Address { site, address } => match self.resolve(&session, *site, address).await {
                Ok(Some(url)) => url,
                Ok(None) => {
                    return self.fail(target, format!("Unresolved: no confident match for {address}"))
                }
                Err(e) => return self.fail(target, format!("Resolution failed: {e}")),
            },
        };

        scrape_site(&session, &url, &self.table, &self.options, self.observer.as_ref()).await
    }

    async fn resolve<S: BrowserSession>(
        &self,
        session: &S,
        site: SiteId,
        address: &str,
    ) -> Result<Option<String>, SessionError> {
        if let Some(url) = self.url_cache.get(site, address) {
            tracing::debug!(site = site.domain(), address, "resolved from cache");
            return Ok(Some(url));
        }

        let resolver = PropertyResolver::with_surface(self.surface(site), session, self.resolver);
        let found = retry_with_backoff_if(&self.options.retry, SessionError::is_transient, || {
            resolver.get_property_url(address)
        })
        .await?;

        Ok(found.map(|url| {
            tracing::info!(site = site.domain(), address, url = %url, "address resolved");
            self.url_cache.insert_if_absent(site, address, &url)
        }))
    }

    fn surface(&self, site: SiteId) -> SearchSurface {
        let surface = SearchSurface::for_site(site);
        match self.query_urls.get(&site) {
            Some(template) => surface.with_query_url(template.clone()),
            None => surface,
        }
    }

    /// Failure record for a target that never reached extraction. Address
    /// targets have no URL yet.
    fn fail(&self, target: &Target, error: String) -> ScrapingResult {
        let url = match target {
            Target::Url { url, .. } => url.as_str(),
            Target::Address { .. } => "",
        };
        finish(
            ScrapingResult::failed(target.site_name(), url, vec![error]),
            self.observer.as_ref(),
        )
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
