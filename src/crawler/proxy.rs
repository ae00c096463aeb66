//! Proxy rotation
//!
//! Proxies are handed out round-robin. A block page reported against a proxy
//! counts as a strike; proxies at the strike limit are skipped while any
//! healthy proxy remains. Once every proxy is burned the strikes are reset
//! and rotation starts over.

use crate::config::ProxyConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Source of proxy URLs for outgoing requests
pub trait ProxyProvider: Send + Sync {
    /// Next proxy to use, or None for a direct connection
    fn new_proxy_url(&self) -> Option<String>;

    /// Records that a request through `proxy_url` hit a block page
    fn report_blocked(&self, proxy_url: &str);
}

/// Round-robin pool with per-proxy strike counts
#[derive(Debug)]
pub struct RotatingProxyPool {
    urls: Vec<String>,
    strikes: Mutex<Vec<u32>>,
    cursor: AtomicUsize,
    max_strikes: u32,
    country_code: Option<String>,
    group: Option<String>,
}

impl RotatingProxyPool {
    pub fn new(urls: Vec<String>, max_strikes: u32) -> Self {
        let strikes = vec![0; urls.len()];
        Self {
            urls,
            strikes: Mutex::new(strikes),
            cursor: AtomicUsize::new(0),
            max_strikes: max_strikes.max(1),
            country_code: None,
            group: None,
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        let mut pool = Self::new(config.urls.clone(), config.max_strikes);
        pool.country_code = config.country_code.clone();
        pool.group = config.group.clone();
        if !pool.urls.is_empty() {
            tracing::info!(
                "Proxy pool: {} proxies (country: {}, group: {})",
                pool.urls.len(),
                pool.country_code.as_deref().unwrap_or("any"),
                pool.group.as_deref().unwrap_or("default")
            );
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Current strike count of a proxy, None if it is not in the pool
    pub fn strikes(&self, proxy_url: &str) -> Option<u32> {
        let index = self.urls.iter().position(|u| u == proxy_url)?;
        let strikes = self.strikes.lock().unwrap_or_else(|p| p.into_inner());
        strikes.get(index).copied()
    }
}

impl ProxyProvider for RotatingProxyPool {
    fn new_proxy_url(&self) -> Option<String> {
        if self.urls.is_empty() {
            return None;
        }

        let mut strikes = self.strikes.lock().unwrap_or_else(|p| p.into_inner());
        if strikes.iter().all(|s| *s >= self.max_strikes) {
            tracing::warn!("Every proxy reached {} strikes, resetting", self.max_strikes);
            strikes.iter_mut().for_each(|s| *s = 0);
        }

        let count = self.urls.len();
        for _ in 0..count {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % count;
            if strikes[index] < self.max_strikes {
                return Some(self.urls[index].clone());
            }
        }

        None
    }

    fn report_blocked(&self, proxy_url: &str) {
        let Some(index) = self.urls.iter().position(|u| u == proxy_url) else {
            return;
        };
        let mut strikes = self.strikes.lock().unwrap_or_else(|p| p.into_inner());
        strikes[index] += 1;
        tracing::debug!("Proxy #{} now has {} strikes", index, strikes[index]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(max_strikes: u32) -> RotatingProxyPool {
        RotatingProxyPool::new(
            vec![
                "http://p1:8000".to_string(),
                "http://p2:8000".to_string(),
                "http://p3:8000".to_string(),
            ],
            max_strikes,
        )
    }

    #[test]
    fn test_empty_pool_connects_directly() {
        let pool = RotatingProxyPool::new(Vec::new(), 3);
        assert_eq!(pool.new_proxy_url(), None);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_round_robin() {
        let pool = pool(3);
        let picks: Vec<_> = (0..4).filter_map(|_| pool.new_proxy_url()).collect();
        assert_eq!(
            picks,
            vec!["http://p1:8000", "http://p2:8000", "http://p3:8000", "http://p1:8000"]
        );
    }

    #[test]
    fn test_burned_proxy_is_skipped() {
        let pool = pool(2);
        pool.report_blocked("http://p2:8000");
        pool.report_blocked("http://p2:8000");
        assert_eq!(pool.strikes("http://p2:8000"), Some(2));

        for _ in 0..6 {
            assert_ne!(pool.new_proxy_url().as_deref(), Some("http://p2:8000"));
        }
    }

    #[test]
    fn test_strikes_reset_when_all_burned() {
        let pool = pool(1);
        for url in ["http://p1:8000", "http://p2:8000", "http://p3:8000"] {
            pool.report_blocked(url);
        }
        assert!(pool.new_proxy_url().is_some());
        assert_eq!(pool.strikes("http://p1:8000"), Some(0));
    }

    #[test]
    fn test_unknown_proxy_report_ignored() {
        let pool = pool(1);
        pool.report_blocked("http://elsewhere:8000");
        assert_eq!(pool.strikes("http://elsewhere:8000"), None);
    }
}
