use thiserror::Error;

use crate::extract::table::SelectorTableError;

/// Failures raised by a browsing session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session cannot be created in this environment at all. Never retried.
    #[error("unsupported browsing environment: {0}")]
    UnsupportedEnvironment(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("session is closed")]
    Closed,

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("page query failed: {0}")]
    Query(String),

    #[error("operation not supported by this session: {0}")]
    Unsupported(String),
}

impl SessionError {
    /// Whether a retry could plausibly succeed. Missing capabilities never
    /// appear on retry; everything else might.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            SessionError::UnsupportedEnvironment(_) | SessionError::Unsupported(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error(transparent)]
    Config(#[from] nzhp_core::ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    SelectorTable(#[from] SelectorTableError),
}
