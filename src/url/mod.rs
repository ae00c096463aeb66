//! URL handling for the crawler
//!
//! This module resolves links found on pages, normalizes URLs into
//! deduplication keys, and derives posting ids from detail URLs.

mod normalize;
mod resolve;

pub use normalize::normalize_url;
pub use resolve::{job_id_from_url, resolve_url};

/// Path fragment shared by every job detail URL on the site
pub const JOB_PATH: &str = "/is-ilani/";

/// Returns true if the URL points at a job detail page
pub fn is_job_url(url: &::url::Url) -> bool {
    url.path().contains(JOB_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::url::Url;

    #[test]
    fn test_is_job_url() {
        let job = Url::parse("https://www.kariyer.net/is-ilani/acme-1").unwrap();
        let listing = Url::parse("https://www.kariyer.net/is-ilanlari").unwrap();
        assert!(is_job_url(&job));
        assert!(!is_job_url(&listing));
    }
}
