//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building one client per proxy (direct connections share one too)
//! - Applying the per-request header profile and timeout
//! - Retrying transient failures with exponential backoff and jitter
//! - Error classification

use crate::config::FetchConfig;
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect::Policy, Client, Proxy};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Jitter applied to every backoff delay (fraction of the delay, both ways)
const JITTER_FRACTION: f64 = 0.2;

/// One HTTP GET to perform
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    /// Proxy URL for this request; None connects directly
    pub proxy: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

/// Response of a completed request, whatever its status
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status_code: u16,
    /// URL after redirects
    pub final_url: Url,
    pub body: String,
}

/// Fetch failures that produced no HTTP response
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FetchError {
    /// Timeouts and network errors are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network { .. })
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            Self::Network {
                url: url.to_string(),
                message: format!("Connection failed: {}", error),
            }
        } else if error.is_builder() {
            Self::Client(error.to_string())
        } else {
            Self::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Performs HTTP GETs for the coordinator's workers
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Retry schedule for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`,
    /// capped at `max_delay`, then jittered by ±20%
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as f64;
        let cap = self.max_delay.as_millis() as f64;
        let exponential = (base * 2f64.powi(attempt.min(30) as i32)).min(cap);

        let jitter = rand::thread_rng().gen_range(-JITTER_FRACTION..=JITTER_FRACTION);
        Duration::from_millis((exponential * (1.0 + jitter)).max(0.0) as u64)
    }

    /// Server errors and rate limiting are retried; other statuses are final
    pub fn is_retryable_status(status: u16) -> bool {
        status == 429 || (500..600).contains(&status)
    }
}

/// reqwest-backed fetcher with a client cache keyed by proxy
pub struct ReqwestFetcher {
    clients: Mutex<HashMap<Option<String>, Client>>,
    policy: RetryPolicy,
}

impl ReqwestFetcher {
    /// Creates a fetcher and builds the direct-connection client up front
    pub fn new(policy: RetryPolicy) -> Result<Self, FetchError> {
        let direct = build_http_client(None)?;
        let mut clients = HashMap::new();
        clients.insert(None, direct);

        Ok(Self {
            clients: Mutex::new(clients),
            policy,
        })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::new(RetryPolicy::from_config(config))
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<Client, FetchError> {
        let key = proxy.map(str::to_string);
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let client = build_http_client(proxy)?;
        clients.insert(key, client.clone());
        Ok(client)
    }

    async fn attempt(
        &self,
        client: &Client,
        request: &FetchRequest,
        headers: HeaderMap,
    ) -> Result<FetchResponse, FetchError> {
        let response = client
            .get(request.url.clone())
            .headers(headers)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&request.url, e))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&request.url, e))?;

        Ok(FetchResponse {
            status_code,
            final_url,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let client = self.client_for(request.proxy.as_deref())?;
        let headers = header_map(&request.headers);
        let mut attempt = 0;

        loop {
            let result = self.attempt(&client, &request, headers.clone()).await;

            let retryable = match &result {
                Ok(response) => RetryPolicy::is_retryable_status(response.status_code),
                Err(e) => e.is_retryable(),
            };
            if !retryable || attempt >= self.policy.max_retries {
                return result;
            }

            let delay = self.policy.delay_for(attempt);
            match &result {
                Ok(response) => tracing::debug!(
                    "HTTP {} for {}, retry {} in {:?}",
                    response.status_code,
                    request.url,
                    attempt + 1,
                    delay
                ),
                Err(e) => tracing::debug!("{}, retry {} in {:?}", e, attempt + 1, delay),
            }

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Builds an HTTP client, optionally routed through a proxy
pub fn build_http_client(proxy: Option<&str>) -> Result<Client, FetchError> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = proxy {
        let proxy = Proxy::all(proxy_url).map_err(|e| FetchError::Client(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| FetchError::Client(e.to_string()))
}

fn header_map(headers: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::debug!("Dropping invalid header {}: {}", name, value),
        }
    }
    map
}
