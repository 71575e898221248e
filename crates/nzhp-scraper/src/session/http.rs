//! Static-HTML browsing session: `reqwest` fetches, `scraper` queries.
//!
//! Pages are kept as source text and re-parsed per query on the blocking
//! pool, so no parsed document is ever held across an await point and a
//! caller's timeout can give up on a slow parse.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};

use super::{xpath, BrowserSession, PageLink, SessionFactory};
use crate::error::SessionError;
use crate::resolve::SearchSurface;

const BLANK_PAGE: &str = "about:blank";

#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    source: Arc<str>,
}

/// A [`BrowserSession`] over plain HTTP GETs.
///
/// Runs no scripts, so it only sees what the server renders.
pub struct HttpSession {
    client: Client,
    page: Mutex<Option<LoadedPage>>,
    closed: AtomicBool,
    page_load_timeout: Duration,
}

impl HttpSession {
    /// Builds a session with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnsupportedEnvironment`] if the HTTP client
    /// cannot be constructed (e.g. no TLS backend).
    pub fn new(user_agent: &str, page_load_timeout: Duration) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(page_load_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SessionError::UnsupportedEnvironment(e.to_string()))?;
        Ok(Self {
            client,
            page: Mutex::new(None),
            closed: AtomicBool::new(false),
            page_load_timeout,
        })
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn loaded_page(&self) -> Result<LoadedPage, SessionError> {
        self.ensure_open()?;
        self.page
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| SessionError::Navigation {
                url: BLANK_PAGE.to_string(),
                reason: "no page loaded".to_string(),
            })
    }

    fn store_page(&self, page: Option<LoadedPage>) {
        *self.page.lock().unwrap_or_else(PoisonError::into_inner) = page;
    }
}

pub(super) fn parse_selector(selector: &str) -> Result<Selector, SessionError> {
    Selector::parse(selector).map_err(|e| SessionError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text nodes of an element, whitespace-collapsed, one per line.
fn element_lines(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs `query` over the page source on the blocking pool.
async fn query_page<T, Q>(source: Arc<str>, query: Q) -> Result<T, SessionError>
where
    T: Send + 'static,
    Q: FnOnce(&str) -> Result<T, SessionError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || query(&source))
        .await
        .map_err(|e| SessionError::Query(e.to_string()))?
}

pub(super) fn first_match_text(source: &str, selector: &Selector) -> Option<String> {
    let document = Html::parse_document(source);
    document
        .select(selector)
        .next()
        .map(|element| element_text(&element))
}

pub(super) fn collect_links(source: &str, base: Option<&Url>, selector: &Selector) -> Vec<PageLink> {
    let document = Html::parse_document(source);
    document
        .select(selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            let absolute = match base {
                Some(base) => base.join(href).ok()?.to_string(),
                None => Url::parse(href).ok()?.to_string(),
            };
            Some(PageLink {
                href: absolute,
                text: element_lines(&element),
            })
        })
        .collect()
}

impl BrowserSession for HttpSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SessionError::Timeout {
                    operation: format!("page load of {url}"),
                    timeout_ms: u64::try_from(self.page_load_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                }
            } else {
                SessionError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().to_string();
        let source = response.text().await?;
        tracing::debug!(url = %final_url, bytes = source.len(), "page loaded");
        self.store_page(Some(LoadedPage {
            url: final_url,
            source: source.into(),
        }));
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        self.ensure_open()?;
        Ok(self
            .page
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or_else(|| BLANK_PAGE.to_string(), |p| p.url.clone()))
    }

    async fn full_page_text(&self) -> Result<String, SessionError> {
        Ok(self.loaded_page()?.source.to_string())
    }

    async fn find_by_css(&self, selector: &str) -> Result<Option<String>, SessionError> {
        let page = self.loaded_page()?;
        let selector = selector.to_string();
        query_page(page.source, move |source| {
            let selector = parse_selector(&selector)?;
            Ok(first_match_text(source, &selector))
        })
        .await
    }

    async fn find_by_xpath(&self, selector: &str) -> Result<Option<String>, SessionError> {
        let css = xpath::to_css(selector).ok_or_else(|| SessionError::InvalidSelector {
            selector: selector.to_string(),
            reason: "XPath outside the supported subset".to_string(),
        })?;
        self.find_by_css(&css).await
    }

    async fn submit_search(&self, surface: &SearchSurface, query: &str) -> Result<(), SessionError> {
        let template = surface.query_url.as_deref().ok_or_else(|| {
            SessionError::Unsupported(format!(
                "search on {} needs an interactive session",
                surface.site
            ))
        })?;
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();
        let url = template.replace("{query}", &encoded);
        self.navigate(&url).await
    }

    async fn find_links(&self, selector: &str) -> Result<Vec<PageLink>, SessionError> {
        let page = self.loaded_page()?;
        let selector = selector.to_string();
        let base = Url::parse(&page.url).ok();
        query_page(page.source, move |source| {
            let selector = parse_selector(&selector)?;
            Ok(collect_links(source, base.as_ref(), &selector))
        })
        .await
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.closed.store(true, Ordering::SeqCst);
        self.store_page(None);
        Ok(())
    }
}

/// Creates [`HttpSession`]s with shared settings.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    pub user_agent: String,
    pub page_load_timeout: Duration,
}

impl HttpSessionFactory {
    #[must_use]
    pub fn new(user_agent: impl Into<String>, page_load_timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            page_load_timeout,
        }
    }
}

impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    async fn create(&self) -> Result<HttpSession, SessionError> {
        HttpSession::new(&self.user_agent, self.page_load_timeout)
    }
}
