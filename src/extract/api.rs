//! JSON search API listing source
//!
//! `GET /search/positions?page=N&keyword=..&location=..` answers with
//! `{ "data": { "positions": [...], "pageCount": N } }`.

use crate::extract::listing::ListingPage;
use crate::extract::text::collapse_whitespace;
use crate::job::PartialJobRecord;
use crate::url::{job_id_from_url, resolve_url};
use serde::Deserialize;
use url::Url;

pub const API_SEARCH_URL: &str = "https://api.kariyer.net/search/positions";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<SearchData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchData {
    #[serde(default)]
    positions: Vec<Position>,
    #[serde(default)]
    page_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Position {
    position_url: Option<String>,
    title: Option<String>,
    company_name: Option<String>,
    location: Option<String>,
    publish_date: Option<String>,
}

/// Page number carried in the `page` query parameter (1 when absent)
pub fn api_page_number(url: &Url) -> u32 {
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(1)
}

/// Returns `url` with its `page` parameter set to `page`
pub fn api_page_url(url: &Url, page: u32) -> Url {
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut next = url.clone();
    next.query_pairs_mut()
        .clear()
        .append_pair("page", &page.to_string())
        .extend_pairs(others);
    next
}

/// Parses one API response into listing cards
///
/// Position URLs are resolved against `site_base`; positions without one are
/// skipped. A next page exists while the response has positions and, when
/// the API reports a page count, the current page is below it.
pub fn extract_api_listing(
    body: &str,
    page_url: &Url,
    site_base: &Url,
) -> Result<ListingPage, serde_json::Error> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let data = response.data.unwrap_or_default();

    let has_positions = !data.positions.is_empty();
    let cards = data
        .positions
        .into_iter()
        .filter_map(|position| position.into_partial(site_base))
        .collect();

    let page = api_page_number(page_url);
    let more = has_positions && data.page_count.map_or(true, |count| page < count);

    Ok(ListingPage {
        cards,
        next_page: more.then(|| api_page_url(page_url, page + 1)),
    })
}

impl Position {
    fn into_partial(self, site_base: &Url) -> Option<PartialJobRecord> {
        let url = resolve_url(site_base, self.position_url.as_deref()?)?;

        Some(PartialJobRecord {
            id: job_id_from_url(&url),
            url: Some(url.to_string()),
            title: clean(self.title),
            company: clean(self.company_name),
            location: clean(self.location),
            date_posted: clean(self.publish_date),
            ..Default::default()
        })
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
}
