//! In-memory session for unit tests: canned HTML per URL and per search query.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::Url;

use super::http::{collect_links, first_match_text, parse_selector};
use super::{xpath, BrowserSession, PageLink, SessionFactory};
use crate::error::SessionError;
use crate::resolve::SearchSurface;

const EMPTY_RESULTS: &str = "<html><body><p>No results</p></body></html>";

#[derive(Default)]
pub(crate) struct FakeSession {
    pages: HashMap<String, String>,
    searches: HashMap<String, String>,
    current: Mutex<Option<(String, String)>>,
    pub(crate) queries: Mutex<Vec<String>>,
    pub(crate) navigations: AtomicU32,
    failing_navigations: AtomicU32,
    pub(crate) dead: AtomicBool,
    pub(crate) closed: AtomicBool,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Results page served when `query` is submitted through any surface.
    pub(crate) fn with_search(mut self, query: &str, html: &str) -> Self {
        self.searches.insert(query.to_string(), html.to_string());
        self
    }

    /// The next `n` navigations fail before any succeeds.
    pub(crate) fn failing_navigations(self, n: u32) -> Self {
        self.failing_navigations.store(n, Ordering::SeqCst);
        self
    }

    pub(crate) fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().expect("queries lock").clone()
    }

    fn current(&self) -> Result<(String, String), SessionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        self.current
            .lock()
            .expect("current page lock")
            .clone()
            .ok_or_else(|| SessionError::Navigation {
                url: "about:blank".to_string(),
                reason: "no page loaded".to_string(),
            })
    }

    fn load(&self, url: String, html: String) {
        *self.current.lock().expect("current page lock") = Some((url, html));
    }
}

impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.navigations.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        let pending = self.failing_navigations.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_navigations.store(pending - 1, Ordering::SeqCst);
            return Err(SessionError::Navigation {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        let html = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| SessionError::Navigation {
                url: url.to_string(),
                reason: "HTTP 404".to_string(),
            })?;
        self.load(url.to_string(), html);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        if self.dead.load(Ordering::SeqCst) || self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        Ok(self
            .current
            .lock()
            .expect("current page lock")
            .as_ref()
            .map_or_else(|| "about:blank".to_string(), |(url, _)| url.clone()))
    }

    async fn full_page_text(&self) -> Result<String, SessionError> {
        Ok(self.current()?.1)
    }

    async fn find_by_css(&self, selector: &str) -> Result<Option<String>, SessionError> {
        let (_, html) = self.current()?;
        let selector = parse_selector(selector)?;
        Ok(first_match_text(&html, &selector))
    }

    async fn find_by_xpath(&self, selector: &str) -> Result<Option<String>, SessionError> {
        let css = xpath::to_css(selector).ok_or_else(|| SessionError::InvalidSelector {
            selector: selector.to_string(),
            reason: "unsupported".to_string(),
        })?;
        self.find_by_css(&css).await
    }

    async fn submit_search(&self, surface: &SearchSurface, query: &str) -> Result<(), SessionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        self.queries
            .lock()
            .expect("queries lock")
            .push(query.to_string());
        let html = self
            .searches
            .get(query)
            .cloned()
            .unwrap_or_else(|| EMPTY_RESULTS.to_string());
        self.load(format!("{}/search", surface.page_url), html);
        Ok(())
    }

    async fn find_links(&self, selector: &str) -> Result<Vec<PageLink>, SessionError> {
        let (url, html) = self.current()?;
        let selector = parse_selector(selector)?;
        let base = Url::parse(&url).ok();
        Ok(collect_links(&html, base.as_ref(), &selector))
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out [`FakeSession`]s serving the same pages.
#[derive(Default)]
pub(crate) struct FakeFactory {
    pages: HashMap<String, String>,
    searches: HashMap<String, String>,
    pub(crate) created: Arc<AtomicU32>,
    failing_creations: AtomicU32,
    unsupported: bool,
}

impl FakeFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub(crate) fn with_search(mut self, query: &str, html: &str) -> Self {
        self.searches.insert(query.to_string(), html.to_string());
        self
    }

    pub(crate) fn failing_creations(self, n: u32) -> Self {
        self.failing_creations.store(n, Ordering::SeqCst);
        self
    }

    pub(crate) fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    pub(crate) fn created_count(&self) -> u32 {
        self.created.load(Ordering::SeqCst)
    }
}

impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn create(&self) -> Result<FakeSession, SessionError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if self.unsupported {
            return Err(SessionError::UnsupportedEnvironment(
                "no browser available".to_string(),
            ));
        }
        let pending = self.failing_creations.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_creations.store(pending - 1, Ordering::SeqCst);
            return Err(SessionError::Navigation {
                url: "about:blank".to_string(),
                reason: "browser crashed on start".to_string(),
            });
        }
        let mut session = FakeSession::new();
        for (url, html) in &self.pages {
            session = session.with_page(url, html);
        }
        for (query, html) in &self.searches {
            session = session.with_search(query, html);
        }
        Ok(session)
    }
}
