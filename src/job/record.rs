use crate::extract::html_to_text;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// Site identifier stamped on every record
pub const SOURCE: &str = "kariyer.net";

/// Fields collected for one posting before it is emitted
///
/// Every field is independent; an extractor that cannot find one leaves it
/// as None.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialJobRecord {
    pub url: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub work_model: Option<String>,
    pub date_posted: Option<String>,
    pub description_html: Option<String>,
    pub logo_url: Option<String>,
    pub is_sponsored: Option<bool>,
}

impl PartialJobRecord {
    /// Merges the detail-stage extraction into the listing-stage record
    ///
    /// Listing-owned fields keep their listing value and only take the detail
    /// value when the listing had none. `date_posted` and `description_html`
    /// are owned by the detail page: its value wins whenever present.
    pub fn merge_detail(self, detail: PartialJobRecord) -> PartialJobRecord {
        // Destructured so a new field cannot be added without choosing an owner
        let PartialJobRecord {
            url,
            id,
            title,
            company,
            location,
            employment_type,
            work_model,
            date_posted,
            description_html,
            logo_url,
            is_sponsored,
        } = detail;

        PartialJobRecord {
            url: self.url.or(url),
            id: self.id.or(id),
            title: self.title.or(title),
            company: self.company.or(company),
            location: self.location.or(location),
            employment_type: self.employment_type.or(employment_type),
            work_model: self.work_model.or(work_model),
            logo_url: self.logo_url.or(logo_url),
            is_sponsored: self.is_sponsored.or(is_sponsored),
            date_posted: date_posted.or(self.date_posted),
            description_html: description_html.or(self.description_html),
        }
    }
}

/// A finished job posting, as written to the sink
///
/// `description_text` is private: it is only ever computed from
/// `description_html` in [`JobRecord::from_partial`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub url: String,
    pub id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub work_model: Option<String>,
    pub date_posted: Option<String>,
    pub description_html: Option<String>,
    description_text: Option<String>,
    pub logo_url: Option<String>,
    pub is_sponsored: Option<bool>,
    pub source: &'static str,
    pub crawled_at: DateTime<Utc>,
}

impl JobRecord {
    /// Finalizes a partial record
    ///
    /// `page_url` is used when the partial carries no URL of its own.
    pub fn from_partial(
        partial: PartialJobRecord,
        page_url: &Url,
        crawled_at: DateTime<Utc>,
    ) -> Self {
        let description_text = partial.description_html.as_deref().map(html_to_text);

        Self {
            url: partial.url.unwrap_or_else(|| page_url.to_string()),
            id: partial.id,
            title: partial.title,
            company: partial.company,
            location: partial.location,
            employment_type: partial.employment_type,
            work_model: partial.work_model,
            date_posted: partial.date_posted,
            description_html: partial.description_html,
            description_text,
            logo_url: partial.logo_url,
            is_sponsored: partial.is_sponsored,
            source: SOURCE,
            crawled_at,
        }
    }

    /// Plain-text rendering of `description_html`
    pub fn description_text(&self) -> Option<&str> {
        self.description_text.as_deref()
    }
}
