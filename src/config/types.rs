use crate::filter::AgeWindow;
use crate::ConfigError;
use serde::Deserialize;
use std::str::FromStr;

/// Default listing page on the site
pub const DEFAULT_LISTING_URL: &str = "https://www.kariyer.net/is-ilanlari";

/// Main configuration structure for Kariyer-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where listing pages come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ListingSource {
    /// Server-rendered HTML listing pages
    #[default]
    Html,
    /// The JSON search API
    Api,
}

impl ListingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Api => "api",
        }
    }
}

impl FromStr for ListingSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "api" | "json" => Ok(Self::Api),
            other => Err(ConfigError::UnknownListingSource(other.to_string())),
        }
    }
}

impl TryFrom<String> for ListingSource {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What to crawl and when to stop
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Search keyword for derived start URLs
    pub keyword: Option<String>,

    /// Location filter for derived start URLs
    pub location: Option<String>,

    /// Explicit listing URLs; when set, keyword and location are ignored
    pub start_urls: Vec<String>,

    /// Listing page used to derive start URLs and resolve relative links
    pub base_url: String,

    /// Desired number of records (zero or absent = unbounded)
    pub target_count: Option<u64>,

    /// Alias of `target-count`
    pub results_wanted: Option<u64>,

    /// Alias of `target-count`
    pub max_items: Option<u64>,

    /// Maximum listing pages for the whole run
    pub max_pages: u32,

    /// Fetch detail pages and merge them into listing cards
    pub collect_details: bool,

    /// Recency window for postings
    pub age_window: AgeWindow,

    /// Maximum targets in flight
    pub concurrency: u32,

    /// Skip detail URLs already queued in this run
    pub dedupe: bool,

    pub listing_source: ListingSource,

    /// Re-fetch and run the anchor-driven parse when a listing page yields no cards
    pub secondary_parse: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            keyword: None,
            location: None,
            start_urls: Vec::new(),
            base_url: DEFAULT_LISTING_URL.to_string(),
            target_count: None,
            results_wanted: None,
            max_items: None,
            max_pages: 10,
            collect_details: true,
            age_window: AgeWindow::All,
            concurrency: 3,
            dedupe: true,
            listing_source: ListingSource::Html,
            secondary_parse: true,
        }
    }
}

impl CrawlConfig {
    /// Effective target: the smallest positive value among the aliases
    pub fn effective_target_count(&self) -> Option<u64> {
        [self.target_count, self.results_wanted, self.max_items]
            .into_iter()
            .flatten()
            .filter(|n| *n > 0)
            .min()
    }
}

/// HTTP behavior, pacing and hard ceilings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Per-request timeout
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// First backoff delay (milliseconds), doubled per retry
    pub backoff_base_ms: u64,

    /// Backoff cap (milliseconds)
    pub backoff_max_ms: u64,

    /// Lower bound of the pacing delay before each fetch (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the pacing delay before each fetch (milliseconds)
    pub max_delay_ms: u64,

    /// Wall-clock ceiling for the whole run
    pub max_run_seconds: Option<u64>,

    /// Ceiling on HTTP requests for the whole run
    pub max_requests: Option<u64>,

    /// Locale for Accept-Language
    pub locale: String,

    pub referer: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 10_000,
            min_delay_ms: 500,
            max_delay_ms: 1_500,
            max_run_seconds: None,
            max_requests: None,
            locale: "tr-TR".to_string(),
            referer: Some("https://www.google.com/".to_string()),
        }
    }
}

/// Proxy rotation
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProxyConfig {
    /// Proxy URLs, used round-robin; empty means direct connections
    pub urls: Vec<String>,

    pub country_code: Option<String>,

    pub group: Option<String>,

    /// Block reports after which a proxy is skipped
    pub max_strikes: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            country_code: Some("TR".to_string()),
            group: None,
            max_strikes: 3,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the JSON Lines file records are appended to
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "jobs.jsonl".to_string(),
        }
    }
}

/// `[crawl]` values given on the command line; `Some` replaces the file value
#[derive(Debug, Clone, Default)]
pub struct CrawlOverrides {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub start_urls: Vec<String>,
    pub target_count: Option<u64>,
    pub max_pages: Option<u32>,
    pub collect_details: Option<bool>,
    pub age_window: Option<AgeWindow>,
    pub concurrency: Option<u32>,
    pub dedupe: Option<bool>,
    pub listing_source: Option<ListingSource>,
    pub secondary_parse: Option<bool>,
    pub output_path: Option<String>,
}

impl Config {
    /// Applies command line overrides on top of the file values
    ///
    /// A target count from the command line replaces all three aliases.
    pub fn apply_overrides(&mut self, overrides: CrawlOverrides) {
        let crawl = &mut self.crawl;

        if overrides.keyword.is_some() {
            crawl.keyword = overrides.keyword;
        }
        if overrides.location.is_some() {
            crawl.location = overrides.location;
        }
        if !overrides.start_urls.is_empty() {
            crawl.start_urls = overrides.start_urls;
        }
        if let Some(target) = overrides.target_count {
            crawl.target_count = Some(target);
            crawl.results_wanted = None;
            crawl.max_items = None;
        }
        if let Some(max_pages) = overrides.max_pages {
            crawl.max_pages = max_pages;
        }
        if let Some(collect_details) = overrides.collect_details {
            crawl.collect_details = collect_details;
        }
        if let Some(age_window) = overrides.age_window {
            crawl.age_window = age_window;
        }
        if let Some(concurrency) = overrides.concurrency {
            crawl.concurrency = concurrency;
        }
        if let Some(dedupe) = overrides.dedupe {
            crawl.dedupe = dedupe;
        }
        if let Some(source) = overrides.listing_source {
            crawl.listing_source = source;
        }
        if let Some(secondary_parse) = overrides.secondary_parse {
            crawl.secondary_parse = secondary_parse;
        }
        if let Some(path) = overrides.output_path {
            self.output.path = path;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_target_smallest_positive() {
        let crawl = CrawlConfig {
            target_count: Some(0),
            results_wanted: Some(50),
            max_items: Some(20),
            ..Default::default()
        };
        assert_eq!(crawl.effective_target_count(), Some(20));
    }

    #[test]
    fn test_effective_target_unbounded() {
        let crawl = CrawlConfig {
            target_count: Some(0),
            ..Default::default()
        };
        assert_eq!(crawl.effective_target_count(), None);
        assert_eq!(CrawlConfig::default().effective_target_count(), None);
    }

    #[test]
    fn test_listing_source_parse() {
        assert_eq!("HTML".parse::<ListingSource>().unwrap(), ListingSource::Html);
        assert_eq!("api".parse::<ListingSource>().unwrap(), ListingSource::Api);
        assert!(matches!(
            "rss".parse::<ListingSource>(),
            Err(ConfigError::UnknownListingSource(_))
        ));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config.crawl.results_wanted = Some(100);

        config.apply_overrides(CrawlOverrides {
            keyword: Some("rust".to_string()),
            target_count: Some(5),
            collect_details: Some(false),
            age_window: Some(AgeWindow::Last7d),
            output_path: Some("out.jsonl".to_string()),
            ..Default::default()
        });

        assert_eq!(config.crawl.keyword.as_deref(), Some("rust"));
        assert_eq!(config.crawl.effective_target_count(), Some(5));
        assert!(!config.crawl.collect_details);
        assert_eq!(config.crawl.age_window, AgeWindow::Last7d);
        assert_eq!(config.output.path, "out.jsonl");
        assert_eq!(config.crawl.max_pages, 10);
    }
}
