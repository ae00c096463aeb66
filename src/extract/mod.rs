//! Page content to partial job records
//!
//! - `listing`: card parse, anchor-driven fallback parse and pagination
//! - `detail`: per-field fallback tiers over a parsed detail page
//! - `structured`: JSON-LD `JobPosting` blocks
//! - `api`: the JSON search endpoint as a listing source
//! - `selectors`: site field mappings
//! - `text`: text rendering of captured markup

pub mod api;
pub mod detail;
pub mod listing;
pub mod selectors;
pub mod structured;
pub mod text;

pub use api::{api_page_number, api_page_url, extract_api_listing, API_SEARCH_URL};
pub use detail::{extract_detail, first_hit, DetailPage, Tier};
pub use listing::{extract_listing, extract_listing_by_anchor, next_page_url, ListingPage};
pub use structured::{extract_job_posting, JobPosting};
pub use text::{collapse_whitespace, html_to_text};

use crate::job::PartialJobRecord;
use url::Url;

/// What kind of page is being extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    ListingCard,
    Detail,
}

/// Result of [`extract`]
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Cards(ListingPage),
    Detail(PartialJobRecord),
}

/// Extracts an HTML page in the given mode
pub fn extract(html: &str, page_url: &Url, mode: ExtractMode) -> Extracted {
    match mode {
        ExtractMode::ListingCard => Extracted::Cards(extract_listing(html, page_url)),
        ExtractMode::Detail => Extracted::Detail(extract_detail(html, page_url)),
    }
}
