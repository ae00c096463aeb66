use crate::url::normalize_url;
use std::collections::HashSet;
use url::Url;

/// Set of URLs already scheduled during one run
///
/// Members are normalized keys and are never removed. When enforcement is
/// off the set still records every URL but never refuses one.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    seen: HashSet<String>,
    enforce: bool,
}

impl SeenSet {
    /// Creates an empty set
    pub fn new(enforce: bool) -> Self {
        Self {
            seen: HashSet::new(),
            enforce,
        }
    }

    /// Returns true if the URL should be scheduled, marking it seen
    pub fn should_enqueue(&mut self, url: &Url) -> bool {
        let inserted = self.seen.insert(Self::key(url));
        inserted || !self.enforce
    }

    /// Returns true if the URL has been marked seen
    pub fn contains(&self, url: &Url) -> bool {
        self.seen.contains(&Self::key(url))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn key(url: &Url) -> String {
        normalize_url(url.as_str())
            .map(|normalized| normalized.to_string())
            .unwrap_or_else(|_| url.to_string())
    }
}
