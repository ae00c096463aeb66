use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters that only carry campaign or referral context
///
/// Listing pages append these to detail links, so two cards pointing at the
/// same posting can differ only in them.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
    "from",
    "kaynak",
    "position",
    "searchid",
];

/// Normalizes a URL into the key used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Treat `http` and `https` as the same resource (scheme becomes https)
/// 3. Lowercase the host and drop a leading `www.`
/// 4. Collapse empty segments and remove a trailing slash (except root)
/// 5. Remove the fragment
/// 6. Remove tracking parameters (`utm_*` and [`TRACKING_PARAMS`])
/// 7. Sort the remaining parameters and drop an empty query
///
/// # Examples
///
/// ```
/// use kariyer_harvest::url::normalize_url;
///
/// let url = normalize_url("http://WWW.Kariyer.NET/is-ilani/acme-123/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://kariyer.net/is-ilani/acme-123");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" => {
            url.set_scheme("https")
                .map_err(|_| UrlError::InvalidScheme("http".to_string()))?;
        }
        "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Collapses repeated slashes and strips the trailing slash
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}
