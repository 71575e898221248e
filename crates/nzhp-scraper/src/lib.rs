//! Property valuation scraping: sessions, selector cascades, price
//! normalization, address resolution, and the batch pipeline.

pub mod address;
pub mod error;
pub mod extract;
pub mod fuzzy;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod rate_limit;
pub mod resolve;
pub mod retry;
pub mod session;

pub use address::{normalize_address, parse_address, ParsedAddress};
pub use error::{ScraperError, SessionError};
pub use extract::{
    CascadeObserver, NoopObserver, SelectorStrategy, SelectorTable, StrategyKind, TracingObserver,
};
pub use metrics::{calculate_metrics, ScrapingMetrics};
pub use normalize::{convert_to_numeric, format_price, PriceValidator};
pub use pipeline::{observer_for, scrape_site, Pipeline, ScrapeOptions};
pub use rate_limit::RateLimiter;
pub use resolve::{PropertyResolver, ResolverSettings, SearchSurface, UrlCache};
pub use retry::{retry_with_backoff, retry_with_backoff_if, RetryPolicy};
pub use session::{
    BrowserSession, HttpSession, HttpSessionFactory, ManagedSession, PageLink, RateLimitedSession,
    SessionFactory,
};
