//! Browsing-session capability consumed by extraction and resolution.
//!
//! The pipeline never manages browser processes itself; it drives whatever
//! implements [`BrowserSession`]. [`http::HttpSession`] covers static HTML
//! pages, and a headless-browser session plugs into the same trait.

#[cfg(test)]
pub(crate) mod fake;
pub mod http;
pub mod limited;
pub mod managed;
pub mod xpath;

use std::future::Future;

use crate::error::SessionError;
use crate::resolve::SearchSurface;

pub use http::{HttpSession, HttpSessionFactory};
pub use limited::RateLimitedSession;
pub use managed::ManagedSession;

/// An anchor found on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    /// Absolute URL.
    pub href: String,
    /// Visible text, one line per text node.
    pub text: String,
}

/// One live page-browsing handle. A session is used by one task at a time.
pub trait BrowserSession: Send + Sync {
    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Location of the current page. Cheap; doubles as the liveness probe.
    fn current_url(&self) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Source text of the current page, scanned by pattern strategies.
    fn full_page_text(&self) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Trimmed text of the first element matching a CSS selector.
    fn find_by_css(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<String>, SessionError>> + Send;

    /// Trimmed text of the first element matching an XPath expression.
    fn find_by_xpath(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<String>, SessionError>> + Send;

    /// Runs `query` through a site's search surface, leaving the results
    /// page loaded.
    fn submit_search(
        &self,
        surface: &SearchSurface,
        query: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// All anchors on the current page matching `selector`.
    fn find_links(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<PageLink>, SessionError>> + Send;

    fn close(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Creates fresh sessions, e.g. after a health check fails.
pub trait SessionFactory: Send + Sync {
    type Session: BrowserSession;

    fn create(&self) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}

impl<F: SessionFactory> SessionFactory for &F {
    type Session = F::Session;

    fn create(&self) -> impl Future<Output = Result<Self::Session, SessionError>> + Send {
        (**self).create()
    }
}
