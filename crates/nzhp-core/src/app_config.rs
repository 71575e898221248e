use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Run configuration shared by the scraper, resolver, and aggregator.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub targets_path: PathBuf,
    /// Override for the built-in selector table.
    pub selectors_path: Option<PathBuf>,
    pub validate_prices: bool,
    pub enable_logging: bool,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_backoff_factor: f64,
    pub page_load_timeout_secs: u64,
    pub strategy_timeout_ms: u64,
    pub max_concurrent_sites: usize,
    /// Total wall-clock budget for a batch; `None` means unbounded.
    pub batch_budget_secs: Option<u64>,
    pub url_confidence_threshold: f64,
    /// Fuzzy partial-ratio (0-100) a suburb or city must reach to match.
    pub location_match_threshold: u8,
    pub simulation_draws: usize,
    pub user_agent: String,
}

impl AppConfig {
    #[must_use]
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    #[must_use]
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    #[must_use]
    pub fn batch_budget(&self) -> Option<Duration> {
        self.batch_budget_secs.map(Duration::from_secs)
    }
}
