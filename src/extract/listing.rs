//! Listing page extraction
//!
//! The primary parse walks the site's card containers. When that finds
//! nothing (markup change, trimmed response) the anchor-driven parse treats
//! every job link as a card rooted at its closest list item or article.

use crate::extract::selectors::{
    select_all_first_hit, select_first, CARD, CARD_ANCESTORS, CARD_COMPANY, CARD_EMPLOYMENT_TYPE,
    CARD_LINK, CARD_LOCATION, CARD_LOGO, CARD_POSTED, CARD_SPONSORED, CARD_TITLE,
    CARD_WORK_MODEL, NEXT_PAGE_REL, NEXT_PAGE_TOKENS,
};
use crate::extract::text::{collapse_whitespace, fold_case, non_empty_text};
use crate::job::PartialJobRecord;
use crate::url::{is_job_url, job_id_from_url, resolve_url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Cards found on one listing page plus its pagination link
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub cards: Vec<PartialJobRecord>,
    pub next_page: Option<Url>,
}

/// Primary card parse
pub fn extract_listing(html: &str, page_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let cards = select_all_first_hit(root, CARD)
        .into_iter()
        .filter_map(|card| {
            let Some(url) = card_url(card, page_url) else {
                tracing::debug!("Skipping card without a detail link on {}", page_url);
                return None;
            };
            Some(card_record(card, &url, page_url))
        })
        .collect();

    ListingPage {
        cards,
        next_page: next_page_url(root, page_url),
    }
}

/// Secondary, anchor-driven parse
pub fn extract_listing_by_anchor(html: &str, page_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut cards = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(anchors) = Selector::parse("a[href]") {
        for anchor in root.select(&anchors) {
            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_url(page_url, href))
                .filter(is_job_url)
            else {
                continue;
            };
            if !seen.insert(url.to_string()) {
                continue;
            }

            let card = card_root(anchor);
            let mut record = card_record(card, &url, page_url);
            if record.title.is_none() {
                record.title = non_empty_text(anchor);
            }
            cards.push(record);
        }
    }

    ListingPage {
        cards,
        next_page: next_page_url(root, page_url),
    }
}

/// Closest `li`/`article` ancestor of an anchor, or the anchor itself
fn card_root(anchor: ElementRef<'_>) -> ElementRef<'_> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| CARD_ANCESTORS.contains(&el.value().name()))
        .unwrap_or(anchor)
}

fn card_url(card: ElementRef<'_>, page_url: &Url) -> Option<Url> {
    let href_of = |el: ElementRef<'_>| {
        el.value()
            .attr("href")
            .and_then(|href| resolve_url(page_url, href))
    };

    if card.value().name() == "a" {
        if let Some(url) = href_of(card) {
            return Some(url);
        }
    }

    if let Some(url) = select_first(card, CARD_LINK).and_then(href_of) {
        return Some(url);
    }

    let anchors = Selector::parse("a[href]").ok()?;
    let found = card
        .select(&anchors)
        .filter_map(href_of)
        .find(is_job_url);
    found
}

fn card_record(card: ElementRef<'_>, url: &Url, page_url: &Url) -> PartialJobRecord {
    let text = |selectors: &[&str]| select_first(card, selectors).and_then(non_empty_text);

    PartialJobRecord {
        url: Some(url.to_string()),
        id: job_id_from_url(url),
        title: text(CARD_TITLE),
        company: text(CARD_COMPANY),
        location: text(CARD_LOCATION),
        employment_type: text(CARD_EMPLOYMENT_TYPE),
        work_model: text(CARD_WORK_MODEL),
        date_posted: text(CARD_POSTED),
        description_html: None,
        logo_url: card_logo(card, page_url),
        is_sponsored: select_first(card, CARD_SPONSORED).map(|_| true),
    }
}

fn card_logo(card: ElementRef<'_>, page_url: &Url) -> Option<String> {
    let img = select_first(card, CARD_LOGO)?;
    let src = img
        .value()
        .attr("data-src")
        .or_else(|| img.value().attr("src"))?;
    resolve_url(page_url, src).map(|u| u.to_string())
}

/// Finds the next listing page link, resolved against the current page
///
/// Never returns the current page itself.
pub fn next_page_url(root: ElementRef<'_>, page_url: &Url) -> Option<Url> {
    let mut current = page_url.clone();
    current.set_fragment(None);

    let usable = |href: Option<&str>| {
        let mut url = resolve_url(page_url, href?)?;
        url.set_fragment(None);
        (url != current).then_some(url)
    };

    for rel in NEXT_PAGE_REL {
        let Ok(selector) = Selector::parse(rel) else {
            continue;
        };
        if let Some(url) = root
            .select(&selector)
            .find_map(|el| usable(el.value().attr("href")))
        {
            return Some(url);
        }
    }

    let anchors = Selector::parse("a[href]").ok()?;
    let found = root
        .select(&anchors)
        .filter(|a| is_next_link(*a))
        .find_map(|a| usable(a.value().attr("href")));
    found
}

fn is_next_link(anchor: ElementRef<'_>) -> bool {
    let text = collapse_whitespace(&anchor.text().collect::<String>());
    let labels = [
        Some(text.as_str()),
        anchor.value().attr("aria-label"),
        anchor.value().attr("title"),
    ];

    let hit = labels.into_iter().flatten().any(|label| {
        let label = fold_case(&collapse_whitespace(label));
        NEXT_PAGE_TOKENS.contains(&label.as_str())
    });
    hit
}
