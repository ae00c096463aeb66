//! Detail page extraction
//!
//! Every field is resolved through an ordered list of tiers. A tier is a
//! plain function over the parsed page; the first one returning `Some` wins.
//! Structured data always comes first, then site selectors, then the
//! generic heuristics.

use crate::extract::selectors::{
    select_first, BLOCKS, DETAIL_COMPANY, DETAIL_DESCRIPTION, DETAIL_EMPLOYMENT_TYPE,
    DETAIL_LOCATION, DETAIL_POSTED, DETAIL_TITLE, DETAIL_WORK_MODEL, SECTION_KEYWORDS,
};
use crate::extract::structured::{extract_job_posting, JobPosting};
use crate::extract::text::{
    collapse_whitespace, element_text, fold_case, inner_html_without, non_empty_text, HEADINGS,
    NON_CONTENT,
};
use crate::job::PartialJobRecord;
use crate::url::job_id_from_url;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use url::Url;

/// Minimum text length of a keyword-matched description section
pub const MIN_SECTION_CHARS: usize = 300;

/// Minimum text length of the longest-block fallback
pub const MIN_BLOCK_CHARS: usize = 200;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("valid ISO date regex"));

static DOTTED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}\.\d{2}\.\d{4}\b").expect("valid dotted date regex"));

/// A parsed detail page plus its structured data, if any
pub struct DetailPage {
    document: Html,
    url: Url,
    posting: Option<JobPosting>,
}

impl DetailPage {
    pub fn parse(html: &str, url: &Url) -> Self {
        let document = Html::parse_document(html);
        let posting = extract_job_posting(document.root_element());
        Self {
            document,
            url: url.clone(),
            posting,
        }
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.document.root_element()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn posting(&self) -> Option<&JobPosting> {
        self.posting.as_ref()
    }

    fn from_posting(&self, field: fn(&JobPosting) -> &Option<String>) -> Option<String> {
        self.posting.as_ref().and_then(|p| field(p).clone())
    }

    fn text_of(&self, selectors: &[&str]) -> Option<String> {
        select_first(self.root(), selectors).and_then(non_empty_text)
    }

    /// Text of `body`, or of the whole document when there is none
    fn body_text(&self) -> String {
        let body = Selector::parse("body")
            .ok()
            .and_then(|s| self.root().select(&s).next());
        element_text(body.unwrap_or_else(|| self.root()))
    }
}

/// One fallback strategy for a single field
pub type Tier = fn(&DetailPage) -> Option<String>;

pub const TITLE_TIERS: &[Tier] = &[structured_title, selector_title, og_title];
pub const COMPANY_TIERS: &[Tier] = &[structured_company, selector_company];
pub const LOCATION_TIERS: &[Tier] = &[structured_location, selector_location];
pub const EMPLOYMENT_TYPE_TIERS: &[Tier] = &[structured_employment_type, selector_employment_type];
pub const WORK_MODEL_TIERS: &[Tier] = &[structured_work_model, selector_work_model];
pub const DATE_POSTED_TIERS: &[Tier] = &[
    structured_date_posted,
    time_datetime,
    iso_date_in_text,
    dotted_date_in_text,
];
pub const DESCRIPTION_TIERS: &[Tier] = &[
    structured_description,
    selector_description,
    keyword_section,
    longest_text_block,
];

/// Runs tiers in order and returns the first hit
pub fn first_hit(page: &DetailPage, tiers: &[Tier]) -> Option<String> {
    tiers.iter().find_map(|tier| tier(page))
}

/// Extracts a detail page into a partial record
pub fn extract_detail(html: &str, url: &Url) -> PartialJobRecord {
    let page = DetailPage::parse(html, url);
    extract_detail_page(&page)
}

pub fn extract_detail_page(page: &DetailPage) -> PartialJobRecord {
    PartialJobRecord {
        url: Some(page.url().to_string()),
        id: job_id_from_url(page.url()),
        title: first_hit(page, TITLE_TIERS),
        company: first_hit(page, COMPANY_TIERS),
        location: first_hit(page, LOCATION_TIERS),
        employment_type: first_hit(page, EMPLOYMENT_TYPE_TIERS),
        work_model: first_hit(page, WORK_MODEL_TIERS),
        date_posted: first_hit(page, DATE_POSTED_TIERS),
        description_html: first_hit(page, DESCRIPTION_TIERS),
        logo_url: None,
        is_sponsored: None,
    }
}

fn structured_title(page: &DetailPage) -> Option<String> {
    page.from_posting(|p| &p.title)
}

fn structured_company(page: &DetailPage) -> Option<String> {
    page.from_posting(|p| &p.company)
}

fn structured_location(page: &DetailPage) -> Option<String> {
    page.from_posting(|p| &p.location)
}

fn structured_employment_type(page: &DetailPage) -> Option<String> {
    page.from_posting(|p| &p.employment_type)
}

fn structured_work_model(page: &DetailPage) -> Option<String> {
    page.from_posting(|p| &p.work_model)
}

fn structured_date_posted(page: &DetailPage) -> Option<String> {
    page.from_posting(|p| &p.date_posted)
}

fn structured_description(page: &DetailPage) -> Option<String> {
    page.from_posting(|p| &p.description_html)
}

fn selector_title(page: &DetailPage) -> Option<String> {
    page.text_of(DETAIL_TITLE)
}

fn selector_company(page: &DetailPage) -> Option<String> {
    page.text_of(DETAIL_COMPANY)
}

fn selector_location(page: &DetailPage) -> Option<String> {
    page.text_of(DETAIL_LOCATION)
}

fn selector_employment_type(page: &DetailPage) -> Option<String> {
    page.text_of(DETAIL_EMPLOYMENT_TYPE)
}

fn selector_work_model(page: &DetailPage) -> Option<String> {
    page.text_of(DETAIL_WORK_MODEL)
}

fn og_title(page: &DetailPage) -> Option<String> {
    let selector = Selector::parse(r#"meta[property="og:title"]"#).ok()?;
    let content = page.root().select(&selector).next()?.value().attr("content")?;
    let title = collapse_whitespace(content);
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

fn time_datetime(page: &DetailPage) -> Option<String> {
    let element = select_first(page.root(), DETAIL_POSTED)?;
    let value = element.value().attr("datetime")?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn iso_date_in_text(page: &DetailPage) -> Option<String> {
    ISO_DATE
        .find(&page.body_text())
        .map(|m| m.as_str().to_string())
}

fn dotted_date_in_text(page: &DetailPage) -> Option<String> {
    DOTTED_DATE
        .find(&page.body_text())
        .map(|m| m.as_str().to_string())
}

fn selector_description(page: &DetailPage) -> Option<String> {
    let element = select_first(page.root(), DETAIL_DESCRIPTION)?;
    let html = inner_html_without(element, NON_CONTENT);
    if element_text(element).is_empty() {
        None
    } else {
        Some(html)
    }
}

fn is_keyword_section(element: ElementRef<'_>) -> bool {
    let text = element_text(element);
    if text.chars().count() < MIN_SECTION_CHARS {
        return false;
    }
    let lowered = fold_case(&text);
    SECTION_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Keyword-bearing blocks under `outer` that are not nested in another one
fn top_keyword_blocks<'a>(outer: ElementRef<'a>, blocks: &Selector) -> Vec<ElementRef<'a>> {
    let candidates: Vec<ElementRef<'a>> = outer
        .select(blocks)
        .filter(|el| el.id() != outer.id() && is_keyword_section(*el))
        .collect();

    candidates
        .iter()
        .filter(|el| {
            !el.ancestors()
                .any(|a| candidates.iter().any(|c| c.id() == a.id()))
        })
        .copied()
        .collect()
}

/// First block in document order that is long enough and mentions a section
/// keyword
///
/// The match narrows into a nested block only while that block is the sole
/// keyword-bearing one, so sibling sections stay together.
fn keyword_section(page: &DetailPage) -> Option<String> {
    let blocks = Selector::parse(BLOCKS).ok()?;
    let mut current = page.root().select(&blocks).find(|el| is_keyword_section(*el))?;

    loop {
        match top_keyword_blocks(current, &blocks).as_slice() {
            [only] => current = *only,
            _ => break,
        }
    }

    let skip: Vec<&str> = HEADINGS.iter().chain(NON_CONTENT).copied().collect();
    Some(inner_html_without(current, &skip))
}

fn is_leaf_block(element: ElementRef<'_>, blocks: &Selector) -> bool {
    !element.select(blocks).any(|inner| inner.id() != element.id())
}

/// Text a block carries itself: its inline text plus the text of leaf blocks
/// directly under it
fn block_text_chars(element: ElementRef<'_>, blocks: &Selector) -> usize {
    if is_leaf_block(element, blocks) {
        return element_text(element).chars().count();
    }

    let mut total = 0;
    for child in element.children() {
        match child.value() {
            Node::Text(text) => total += collapse_whitespace(text).chars().count(),
            Node::Element(el) if NON_CONTENT.contains(&el.name()) => {}
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if !blocks.matches(&child_el) {
                    total += block_text_chars(child_el, blocks);
                } else if is_leaf_block(child_el, blocks) {
                    total += element_text(child_el).chars().count();
                }
            }
            _ => {}
        }
    }
    total
}

/// Block carrying the most text of its own, if that clears the minimum
///
/// Ties go to the later block in document order, which is the deeper one
/// when a block wraps a single paragraph.
fn longest_text_block(page: &DetailPage) -> Option<String> {
    let blocks = Selector::parse(BLOCKS).ok()?;

    page.root()
        .select(&blocks)
        .map(|el| (el, block_text_chars(el, &blocks)))
        .filter(|(_, len)| *len >= MIN_BLOCK_CHARS)
        .max_by_key(|(_, len)| *len)
        .map(|(el, _)| inner_html_without(el, NON_CONTENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://www.kariyer.net/is-ilani/acme-backend-developer-4012345").unwrap()
    }

    fn filler(n: usize) -> String {
        "lorem ipsum ".repeat(n)
    }

    #[test]
    fn test_structured_null_title_falls_back_to_h1() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"JobPosting","title":null,"datePosted":"2024-06-01"}</script>
            </head><body><h1>
                Backend   Developer
            </h1></body></html>"#;
        let record = extract_detail(html, &url());
        assert_eq!(record.title.as_deref(), Some("Backend Developer"));
        assert_eq!(record.date_posted.as_deref(), Some("2024-06-01"));
        assert_eq!(record.id.as_deref(), Some("4012345"));
    }

    #[test]
    fn test_structured_fields_win() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"JobPosting","title":"From LD","hiringOrganization":{"name":"Acme"}}</script>
            </head><body><h1>From H1</h1><span class="company-name">Other</span></body></html>"#;
        let record = extract_detail(html, &url());
        assert_eq!(record.title.as_deref(), Some("From LD"));
        assert_eq!(record.company.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_og_title_last_resort() {
        let html = r#"<html><head><meta property="og:title" content="Meta Title"></head><body></body></html>"#;
        let record = extract_detail(html, &url());
        assert_eq!(record.title.as_deref(), Some("Meta Title"));
    }

    #[test]
    fn test_description_selector() {
        let html = r#"<body><div class="job-description"><p>Build services</p><script>x()</script></div></body>"#;
        let record = extract_detail(html, &url());
        assert_eq!(record.description_html.as_deref(), Some("<p>Build services</p>"));
    }

    #[test]
    fn test_keyword_section_innermost_without_headings() {
        let html = format!(
            r#"<body><main><div id="outer"><section id="inner"><h2>İş Tanımı</h2><p>{}</p></section></div></main></body>"#,
            filler(40)
        );
        let page = DetailPage::parse(&html, &url());
        let section = keyword_section(&page).unwrap();
        assert!(section.starts_with("<p>lorem"));
        assert!(!section.contains("<h2>"));
        assert!(!section.contains("section"));
    }

    #[test]
    fn test_keyword_section_requires_length() {
        let html = r#"<body><section><h2>Aranan Nitelikler</h2><p>short</p></section></body>"#;
        let page = DetailPage::parse(html, &url());
        assert_eq!(keyword_section(&page), None);
    }

    #[test]
    fn test_keyword_section_keeps_sibling_sections() {
        let html = format!(
            r#"<body><div id="desc">
                <section><h2>İş Tanımı</h2><p>duties {}</p></section>
                <section><h2>Aranan Nitelikler</h2><p>qualifications {}</p></section>
            </div></body>"#,
            filler(30),
            filler(30)
        );
        let page = DetailPage::parse(&html, &url());
        let section = keyword_section(&page).unwrap();
        assert!(section.contains("duties"));
        assert!(section.contains("qualifications"));
        assert!(section.contains("<section>"));
        assert!(!section.contains("<h2>"));
    }

    #[test]
    fn test_longest_block_single_paragraph() {
        let html = format!(
            r#"<body><div><p>{}</p></div><p>{}</p></body>"#,
            filler(30),
            filler(5)
        );
        let page = DetailPage::parse(&html, &url());
        let block = longest_text_block(&page).unwrap();
        assert_eq!(block.trim(), filler(30).trim());
    }

    #[test]
    fn test_longest_block_many_short_paragraphs() {
        let paragraphs: String = (0..10)
            .map(|i| format!("<p>paragraph {} {}</p>", i, filler(9)))
            .collect();
        let html = format!(
            r#"<body><nav><div>Ana Sayfa</div></nav><div class="content">{}</div><footer><p>© 2024</p></footer></body>"#,
            paragraphs
        );
        let page = DetailPage::parse(&html, &url());
        let block = longest_text_block(&page).unwrap();
        assert!(block.starts_with("<p>paragraph 0"));
        assert!(block.contains("paragraph 9"));
        assert!(!block.contains("Ana Sayfa"));

        let record = extract_detail(&html, &url());
        assert_eq!(record.description_html, Some(block));
    }

    #[test]
    fn test_longest_block_minimum() {
        let page = DetailPage::parse("<body><p>tiny</p></body>", &url());
        assert_eq!(longest_text_block(&page), None);
    }

    #[test]
    fn test_date_fallbacks() {
        let with_time = r#"<body><time datetime="2024-05-30T10:00:00Z">30 Mayıs</time></body>"#;
        assert_eq!(
            extract_detail(with_time, &url()).date_posted.as_deref(),
            Some("2024-05-30T10:00:00Z")
        );

        let iso = "<body><p>Yayın tarihi: 2024-05-29</p></body>";
        assert_eq!(extract_detail(iso, &url()).date_posted.as_deref(), Some("2024-05-29"));

        let dotted = "<body><p>Yayın tarihi: 28.05.2024</p></body>";
        assert_eq!(extract_detail(dotted, &url()).date_posted.as_deref(), Some("28.05.2024"));
    }

    #[test]
    fn test_empty_page() {
        let record = extract_detail("<html><body></body></html>", &url());
        assert_eq!(record.title, None);
        assert_eq!(record.description_html, None);
        assert_eq!(record.date_posted, None);
        assert!(record.url.is_some());
    }
}
