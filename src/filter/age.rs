//! Posting age filter
//!
//! Posted dates show up either as relative phrases ("3 gün önce",
//! "5 hours ago") on listing cards or as absolute dates in structured data.
//! Both are converted to elapsed days and compared with the window.
//!
//! Values that cannot be parsed are treated as within every window, so a
//! layout change never silently drops postings.

use crate::extract::text::fold_case;
use crate::ConfigError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::LazyLock;

static RELATIVE_AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\+?\s*([\p{L}]+)\s+(?:önce|once|ago)\s*$")
        .expect("relative age pattern is valid")
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Recency window requested for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum AgeWindow {
    #[default]
    All,
    Last24h,
    Last7d,
    Last30d,
}

impl AgeWindow {
    /// Inclusive upper bound in days, None for `All`
    pub fn max_days(&self) -> Option<f64> {
        match self {
            Self::All => None,
            Self::Last24h => Some(1.0),
            Self::Last7d => Some(7.0),
            Self::Last30d => Some(30.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Last24h => "24h",
            Self::Last7d => "7d",
            Self::Last30d => "30d",
        }
    }
}

impl FromStr for AgeWindow {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "any" => Ok(Self::All),
            "24h" | "1d" | "24 hours" | "last_24h" => Ok(Self::Last24h),
            "7d" | "7 days" | "last_7d" => Ok(Self::Last7d),
            "30d" | "30 days" | "last_30d" => Ok(Self::Last30d),
            other => Err(ConfigError::UnknownAgeWindow(other.to_string())),
        }
    }
}

impl TryFrom<String> for AgeWindow {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Returns true if a posting with this posted value belongs to the window
///
/// Uses the current time; see [`is_within_age_at`] for a fixed clock.
pub fn is_within_age(posted: Option<&str>, window: AgeWindow) -> bool {
    is_within_age_at(posted, window, Utc::now())
}

/// Returns true if a posting with this posted value belongs to the window at `now`
pub fn is_within_age_at(posted: Option<&str>, window: AgeWindow, now: DateTime<Utc>) -> bool {
    let Some(max_days) = window.max_days() else {
        return true;
    };

    match posted.and_then(|value| elapsed_days(value, now)) {
        Some(days) => days <= max_days,
        None => true,
    }
}

/// Converts a posted value into days elapsed before `now`
///
/// Future dates yield negative values. Returns None when the value is in no
/// known format.
pub fn elapsed_days(value: &str, now: DateTime<Utc>) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    relative_days(value).or_else(|| absolute_days(value, now))
}

fn relative_days(value: &str) -> Option<f64> {
    let lowered = fold_case(value);
    match lowered.as_str() {
        "bugün" | "bugun" | "today" | "az önce" | "just now" | "yeni" | "new" => return Some(0.0),
        "dün" | "dun" | "yesterday" => return Some(1.0),
        _ => {}
    }

    let captures = RELATIVE_AGE.captures(&lowered)?;
    let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = unit_in_days(captures.get(2)?.as_str())?;
    Some(amount * unit)
}

fn unit_in_days(unit: &str) -> Option<f64> {
    let days = match unit {
        "gün" | "gun" | "day" | "days" => 1.0,
        "saat" | "hour" | "hours" | "hr" | "hrs" => 1.0 / 24.0,
        "dakika" | "dk" | "minute" | "minutes" | "min" | "mins" => 1.0 / 1440.0,
        "saniye" | "second" | "seconds" | "sn" => 1.0 / 86_400.0,
        "hafta" | "week" | "weeks" => 7.0,
        "ay" | "month" | "months" => 30.0,
        _ => return None,
    };
    Some(days)
}

fn absolute_days(value: &str, now: DateTime<Utc>) -> Option<f64> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        let elapsed = now.signed_duration_since(datetime.with_timezone(&Utc));
        return Some(elapsed.num_seconds() as f64 / 86_400.0);
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            let elapsed = now.signed_duration_since(naive.and_utc());
            return Some(elapsed.num_seconds() as f64 / 86_400.0);
        }
    }

    // Date-only values compare whole calendar days
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some((now.date_naive() - date).num_days() as f64);
        }
    }

    None
}
