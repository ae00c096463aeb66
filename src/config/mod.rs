//! Configuration module for Kariyer-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, applying command line overrides, and deriving start URLs.
//!
//! # Example
//!
//! ```no_run
//! use kariyer_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Listing pages: {}", config.crawl.max_pages);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlConfig, CrawlOverrides, FetchConfig, ListingSource, OutputConfig, ProxyConfig,
    DEFAULT_LISTING_URL,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{derive_start_urls, site_base, validate};
