//! Site field mappings
//!
//! Each list is tried in order; the first selector that matches wins. Lists
//! run from the current kariyer.net markup to older and more generic layouts.

use scraper::{ElementRef, Selector};

/// Listing cards, tried as whole alternatives (first selector with matches wins)
pub const CARD: &[&str] = &[
    "div.list-items-wrapper div.list-items",
    "[data-test='ad-card']",
    "div.job-card",
    "li.job-item",
];

pub const CARD_LINK: &[&str] = &[
    "a.k-ad-card",
    "a[data-test='ad-card-link']",
    "a.job-link",
];

pub const CARD_TITLE: &[&str] = &[
    "[data-test='ad-card-title']",
    ".k-ad-card-title",
    ".job-title",
    "h2",
    "h3",
];

pub const CARD_COMPANY: &[&str] = &[
    "[data-test='subtitle']",
    ".k-ad-card-subtitle",
    ".company-name",
    "[class*='company']",
];

pub const CARD_LOCATION: &[&str] = &["[data-test='location']", ".location", "[class*='location']"];

pub const CARD_WORK_MODEL: &[&str] = &["[data-test='work-model']", ".work-model"];

pub const CARD_EMPLOYMENT_TYPE: &[&str] = &[
    "[data-test='working-type']",
    ".working-type",
    ".employment-type",
];

pub const CARD_POSTED: &[&str] = &["[data-test='ad-date-item']", ".ad-date", ".date", "time"];

pub const CARD_LOGO: &[&str] = &[
    "img[data-test='company-logo']",
    "img.company-logo",
    "img",
];

pub const CARD_SPONSORED: &[&str] = &["[data-test='sponsored']", ".sponsored", ".featured"];

/// Elements that may wrap a card in the anchor-driven parse
pub const CARD_ANCESTORS: &[&str] = &["li", "article"];

pub const NEXT_PAGE_REL: &[&str] = &["a[rel='next']", "link[rel='next']"];

/// Link texts (lowercase) that mean "next page"
pub const NEXT_PAGE_TOKENS: &[&str] = &[
    "next",
    "next page",
    "sonraki",
    "sonraki sayfa",
    "›",
    "»",
    ">",
    "→",
];

pub const DETAIL_TITLE: &[&str] = &["h1", "[data-test='job-title']"];

pub const DETAIL_COMPANY: &[&str] = &[
    "[data-test='company-name']",
    ".company-name",
    "[class*='company']",
    "h1 a",
];

pub const DETAIL_LOCATION: &[&str] = &["[data-test='location']", "[class*='location']"];

pub const DETAIL_EMPLOYMENT_TYPE: &[&str] = &[
    "[data-test='working-type']",
    "[class*='working-type']",
    "[class*='employment']",
];

pub const DETAIL_WORK_MODEL: &[&str] = &["[data-test='work-model']", "[class*='work-model']"];

pub const DETAIL_DESCRIPTION: &[&str] = &[
    "[data-test='job-description']",
    "[class*='job-description']",
    ".description",
    "#job-description",
];

pub const DETAIL_POSTED: &[&str] = &["time[datetime]"];

/// Block-level elements scanned by the description heuristics
pub const BLOCKS: &str = "div, section, article, main, p";

/// Phrases (lowercase) that open a job description or qualifications section
pub const SECTION_KEYWORDS: &[&str] = &[
    "iş tanımı",
    "iş ilanı detayları",
    "görev tanımı",
    "aranan nitelikler",
    "genel nitelikler",
    "nitelikler",
    "sorumluluklar",
    "job description",
    "qualifications",
    "requirements",
    "responsibilities",
];

/// Returns the first element under `scope` matching any selector, in list order
pub fn select_first<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        let found = scope.select(&selector).next();
        found
    })
}

/// Returns every match of the first selector that matches anything
pub fn select_all_first_hit<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    for s in selectors {
        let Ok(selector) = Selector::parse(s) else {
            continue;
        };
        let found: Vec<_> = scope.select(&selector).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}
