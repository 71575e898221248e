//! Shared domain types and configuration for the house price pipeline.
//!
//! Everything that more than one crate needs to agree on lives here: the
//! fixed site list, price-point and result records, run configuration, and
//! the targets file.

pub mod app_config;
pub mod config;
pub mod prices;
pub mod sites;
pub mod targets;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use prices::{
    MatchInfo, PriceEstimate, PricePoint, Prices, ScrapingResult, SearchResult, ValidationResult,
};
pub use sites::SiteId;
pub use targets::{load_targets, Target, TargetUrls, TargetsFile};

/// Fatal, pre-scrape configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read targets file {path}: {source}")]
    TargetsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in targets file: {0}")]
    TargetsFileParse(#[source] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
