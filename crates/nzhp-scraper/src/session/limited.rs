//! Session wrapper that spaces out page loads.

use tokio::sync::Mutex;

use super::{BrowserSession, PageLink};
use crate::error::SessionError;
use crate::rate_limit::RateLimiter;
use crate::resolve::SearchSurface;

/// Routes every page load of `inner` through a [`RateLimiter`].
///
/// Both `navigate` and `submit_search` load a page, so both wait. Queries
/// against the loaded page pass straight through.
pub struct RateLimitedSession<'a, S> {
    inner: &'a S,
    limiter: Mutex<&'a mut RateLimiter>,
}

impl<'a, S: BrowserSession> RateLimitedSession<'a, S> {
    #[must_use]
    pub fn new(inner: &'a S, limiter: &'a mut RateLimiter) -> Self {
        Self {
            inner,
            limiter: Mutex::new(limiter),
        }
    }

    async fn pace(&self) {
        self.limiter.lock().await.wait_if_needed().await;
    }
}

impl<S: BrowserSession> BrowserSession for RateLimitedSession<'_, S> {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.pace().await;
        self.inner.navigate(url).await
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        self.inner.current_url().await
    }

    async fn full_page_text(&self) -> Result<String, SessionError> {
        self.inner.full_page_text().await
    }

    async fn find_by_css(&self, selector: &str) -> Result<Option<String>, SessionError> {
        self.inner.find_by_css(selector).await
    }

    async fn find_by_xpath(&self, selector: &str) -> Result<Option<String>, SessionError> {
        self.inner.find_by_xpath(selector).await
    }

    async fn submit_search(&self, surface: &SearchSurface, query: &str) -> Result<(), SessionError> {
        self.pace().await;
        self.inner.submit_search(surface, query).await
    }

    async fn find_links(&self, selector: &str) -> Result<Vec<PageLink>, SessionError> {
        self.inner.find_links(selector).await
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.inner.close().await
    }
}
