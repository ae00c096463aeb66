//! Kariyer-Harvest: a two-stage job listing crawler
//!
//! This crate walks paginated job listing pages, enriches postings from their
//! detail pages, and extracts structured records through layered fallbacks,
//! while detecting anti-bot interstitials and degrading gracefully.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod filter;
pub mod job;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-page and per-field problems never surface here; they are contained by
/// the coordinator and counted in the run summary.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No start URL could be derived from the configuration")]
    NoStartUrl,

    #[error("Fetcher initialization failed: {0}")]
    Fetcher(#[from] crawler::FetchError),

    #[error("Output error: {0}")]
    Sink(#[from] output::SinkError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown age window: {0}")]
    UnknownAgeWindow(String),

    #[error("Unknown listing source: {0}")]
    UnknownListingSource(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use filter::{detect_block, is_blocked, is_within_age, AgeWindow};
pub use job::{CrawlTarget, JobRecord, PartialJobRecord};
pub use state::{CrawlBudget, SeenSet, Stage};
pub use crate::url::{job_id_from_url, normalize_url, resolve_url};
