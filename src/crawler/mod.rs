//! Crawler module for fetching and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and per-proxy clients
//! - Browser-like request header profiles
//! - Proxy rotation with block strikes
//! - Frontier scheduling, worker bounds and pacing
//! - Overall two-stage crawl coordination

mod coordinator;
mod fetcher;
mod headers;
mod proxy;
mod scheduler;

pub use coordinator::{run_crawl, Collaborators, Coordinator};
pub use fetcher::{
    build_http_client, FetchError, FetchRequest, FetchResponse, Fetcher, ReqwestFetcher,
    RetryPolicy,
};
pub use headers::{
    Browser, BrowserHeaderGenerator, Device, DeviceProfile, HeaderProfileGenerator,
    OperatingSystem,
};
pub use proxy::{ProxyProvider, RotatingProxyPool};
pub use scheduler::{Pacing, Scheduler};
