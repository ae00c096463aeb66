use crate::config::types::{
    Config, CrawlConfig, FetchConfig, ListingSource, OutputConfig, ProxyConfig, DEFAULT_LISTING_URL,
};
use crate::extract::API_SEARCH_URL;
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawl_config(&config.crawl)?;
    validate_fetch_config(&config.fetch)?;
    validate_proxy_config(&config.proxy)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> ConfigResult<()> {
    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if !config.base_url.is_empty() {
        parse_http_url(&config.base_url, "base_url")?;
    }

    for start in &config.start_urls {
        parse_http_url(start, "start URL")?;
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.backoff_base_ms > config.backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms ({}) must not exceed backoff_max_ms ({})",
            config.backoff_base_ms, config.backoff_max_ms
        )));
    }

    if config.max_run_seconds == Some(0) {
        return Err(ConfigError::Validation(
            "max_run_seconds must be >= 1 when set".to_string(),
        ));
    }

    if config.max_requests == Some(0) {
        return Err(ConfigError::Validation(
            "max_requests must be >= 1 when set".to_string(),
        ));
    }

    if config.locale.trim().is_empty() {
        return Err(ConfigError::Validation("locale cannot be empty".to_string()));
    }

    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> ConfigResult<()> {
    for proxy in &config.urls {
        Url::parse(proxy).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid proxy URL '{}': {}", proxy, e))
        })?;
    }

    if config.max_strikes < 1 {
        return Err(ConfigError::Validation(
            "max_strikes must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation("output path cannot be empty".to_string()));
    }

    Ok(())
}

fn parse_http_url(value: &str, what: &str) -> ConfigResult<Url> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP(S), got '{}'",
            what, value, other
        ))),
    }
}

/// Builds the listing URLs a run starts from
///
/// Explicit start URLs win. Otherwise the HTML source uses the listing base
/// URL with `kw` / `loc` parameters and the API source uses the search
/// endpoint with `page=1`, `keyword` and `location`. An empty result means
/// nothing can be crawled.
pub fn derive_start_urls(config: &CrawlConfig) -> ConfigResult<Vec<Url>> {
    if !config.start_urls.is_empty() {
        return config
            .start_urls
            .iter()
            .map(|s| parse_http_url(s, "start URL"))
            .collect();
    }

    let keyword = non_blank(config.keyword.as_deref());
    let location = non_blank(config.location.as_deref());

    match config.listing_source {
        ListingSource::Html => {
            if config.base_url.is_empty() {
                return Ok(Vec::new());
            }
            let mut url = parse_http_url(&config.base_url, "base_url")?;
            {
                let mut query = url.query_pairs_mut();
                if let Some(kw) = keyword {
                    query.append_pair("kw", kw);
                }
                if let Some(loc) = location {
                    query.append_pair("loc", loc);
                }
            }
            if url.query() == Some("") {
                url.set_query(None);
            }
            Ok(vec![url])
        }
        ListingSource::Api => {
            let mut url = parse_http_url(API_SEARCH_URL, "API URL")?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("page", "1");
                if let Some(kw) = keyword {
                    query.append_pair("keyword", kw);
                }
                if let Some(loc) = location {
                    query.append_pair("location", loc);
                }
            }
            Ok(vec![url])
        }
    }
}

/// Site root used to resolve relative links from API responses
pub fn site_base(config: &CrawlConfig) -> ConfigResult<Url> {
    let base = if config.base_url.is_empty() {
        DEFAULT_LISTING_URL
    } else {
        config.base_url.as_str()
    };
    let url = parse_http_url(base, "base_url")?;
    url.join("/")
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base, e)))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
