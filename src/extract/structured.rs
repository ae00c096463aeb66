//! JSON-LD `JobPosting` extraction
//!
//! Detail pages embed schema.org metadata in `script[type="application/ld+json"]`
//! blocks. A block may hold a single object, an array of objects, or an
//! object with an `@graph` array. Blocks that fail to parse are skipped.

use crate::extract::text::collapse_whitespace;
use scraper::{ElementRef, Selector};
use serde_json::Value;

const LD_JSON: &str = r#"script[type="application/ld+json"]"#;

/// Fields read from a JobPosting block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPosting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub work_model: Option<String>,
    pub date_posted: Option<String>,
    pub description_html: Option<String>,
}

/// Finds the first JobPosting among the page's JSON-LD blocks
pub fn extract_job_posting(root: ElementRef<'_>) -> Option<JobPosting> {
    let selector = Selector::parse(LD_JSON).ok()?;

    root.select(&selector).find_map(|script| {
        let raw = script.text().collect::<String>();
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                return None;
            }
        };
        find_job_posting(&value).map(JobPosting::from_value)
    })
}

/// Returns the first node typed JobPosting in a parsed block
fn find_job_posting(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_job_posting),
        Value::Object(map) => {
            if is_job_posting_type(map.get("@type")) {
                return Some(value);
            }
            map.get("@graph").and_then(find_job_posting)
        }
        _ => None,
    }
}

fn is_job_posting_type(declared: Option<&Value>) -> bool {
    match declared {
        Some(Value::String(s)) => s == "JobPosting",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("JobPosting")),
        _ => false,
    }
}

impl JobPosting {
    fn from_value(value: &Value) -> Self {
        Self {
            title: text_field(value.get("title")),
            company: value.get("hiringOrganization").and_then(named),
            location: value.get("jobLocation").and_then(locality),
            employment_type: value.get("employmentType").and_then(joined),
            work_model: value.get("jobLocationType").and_then(work_model),
            date_posted: text_field(value.get("datePosted")),
            description_html: value
                .get("description")
                .and_then(Value::as_str)
                .map(unescape_markup)
                .filter(|d| !d.trim().is_empty()),
        }
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    let text = collapse_whitespace(value?.as_str()?);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// `{"name": "..."}` or a bare string
fn named(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => text_field(Some(value)),
        Value::Object(_) => text_field(value.get("name")),
        _ => None,
    }
}

/// First place's locality, falling back to region then country
fn locality(value: &Value) -> Option<String> {
    let place = match value {
        Value::Array(places) => places.first()?,
        other => other,
    };
    let address = place.get("address")?;

    if address.is_string() {
        return text_field(Some(address));
    }

    text_field(address.get("addressLocality"))
        .or_else(|| text_field(address.get("addressRegion")))
        .or_else(|| address.get("addressCountry").and_then(named))
}

/// A string, or an array of strings joined with ", "
fn joined(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| text_field(Some(item)))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        other => text_field(Some(other)),
    }
}

fn work_model(value: &Value) -> Option<String> {
    let raw = joined(value)?;
    if raw.eq_ignore_ascii_case("TELECOMMUTE") {
        Some("Remote".to_string())
    } else {
        Some(raw)
    }
}

/// Some sites entity-encode the description markup a second time
fn unescape_markup(description: &str) -> String {
    if description.contains('<') || !description.contains("&lt;") {
        return description.to_string();
    }

    description
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
