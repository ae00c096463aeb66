//! Crawl stage and page outcome definitions
//!
//! A target is fetched in one of two stages; every fetch ends in exactly one
//! outcome, which feeds the run summary.

use std::fmt;

/// The stage a crawl target belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// A paginated listing page containing job cards
    List,

    /// A single job posting page
    Detail,
}

impl Stage {
    /// Returns the lowercase label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Detail => "detail",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the processing of a single target ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    // ===== Success =====
    /// Page was fetched and extracted
    Processed,

    /// Listing page was fetched but yielded no cards, even after the
    /// secondary parse
    Empty,

    // ===== Soft failures =====
    /// Body matched an anti-bot marker
    Blocked,

    // ===== Fetch failures =====
    /// Server answered with HTTP 400 or above after retries
    HttpError,

    /// Timeout or connection failure after retries
    NetworkError,

    /// Worker task panicked or was cancelled
    Aborted,
}

impl PageOutcome {
    /// Returns true if the page content was usable
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed | Self::Empty)
    }

    /// Returns true if the page was skipped because of a failure
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Returns the snake_case label used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Empty => "empty",
            Self::Blocked => "blocked",
            Self::HttpError => "http_error",
            Self::NetworkError => "network_error",
            Self::Aborted => "aborted",
        }
    }

    /// Returns all outcomes, in display order
    pub fn all() -> [Self; 6] {
        [
            Self::Processed,
            Self::Empty,
            Self::Blocked,
            Self::HttpError,
            Self::NetworkError,
            Self::Aborted,
        ]
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
