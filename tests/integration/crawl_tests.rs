//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! listing/detail cycle end-to-end against an in-memory sink.

use kariyer_harvest::config::{Config, ListingSource};
use kariyer_harvest::filter::AgeWindow;
use kariyer_harvest::crawler::{
    BrowserHeaderGenerator, Collaborators, Coordinator, ReqwestFetcher, RotatingProxyPool,
};
use kariyer_harvest::output::{MemorySink, RunSummary};
use kariyer_harvest::state::{PageOutcome, Stage};
use kariyer_harvest::JobRecord;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration starting at `<server>/is-ilanlari`
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.crawl.base_url = format!("{}/is-ilanlari", base_url);
    config.crawl.start_urls = vec![format!("{}/is-ilanlari", base_url)];
    config.crawl.concurrency = 2;
    config.fetch.timeout_secs = 5;
    config.fetch.max_retries = 0;
    config.fetch.backoff_base_ms = 1;
    config.fetch.backoff_max_ms = 1;
    config.fetch.min_delay_ms = 0;
    config.fetch.max_delay_ms = 0;
    config
}

/// Runs a crawl and returns the summary plus the records in emission order
async fn run(config: Config) -> (RunSummary, Vec<JobRecord>) {
    let sink = MemorySink::new();
    let collaborators = Collaborators {
        fetcher: Arc::new(ReqwestFetcher::from_config(&config.fetch).expect("client builds")),
        headers: Arc::new(BrowserHeaderGenerator),
        proxies: Arc::new(RotatingProxyPool::new(Vec::new(), 3)),
        sink: Box::new(sink.clone()),
    };

    let coordinator = Coordinator::new(config, collaborators).expect("coordinator builds");
    let summary = coordinator.run().await.expect("crawl succeeds");
    (summary, sink.records())
}

/// One listing card linking to `/is-ilani/<slug>`
fn card(slug: &str, title: &str) -> String {
    format!(
        r#"<div data-test="ad-card">
            <a data-test="ad-card-link" href="/is-ilani/{slug}">
                <span data-test="ad-card-title">{title}</span>
                <span data-test="subtitle">Acme Yazılım</span>
                <span data-test="ad-date-item">2 gün önce</span>
            </a>
        </div>"#
    )
}

fn listing_page(cards: &[String], next: Option<&str>) -> String {
    let next = next
        .map(|href| format!(r#"<a rel="next" href="{}">Sonraki</a>"#, href))
        .unwrap_or_default();
    format!(
        "<html><head><title>İş İlanları</title></head><body>{}{}</body></html>",
        cards.join("\n"),
        next
    )
}

fn detail_page(title: &str) -> String {
    format!(
        r#"<html><body>
            <h1>{title}</h1>
            <div data-test="job-description"><p>Build and run services.</p></div>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_listing_only_stops_mid_page_at_target() {
    let server = MockServer::start().await;
    let cards: Vec<String> = (1..=8)
        .map(|i| card(&format!("job-{}", i), &format!("Job {}", i)))
        .collect();
    mount_html(&server, "/is-ilanlari", listing_page(&cards, None)).await;

    let mut config = create_test_config(&server.uri());
    config.crawl.collect_details = false;
    config.crawl.target_count = Some(5);

    let (summary, records) = run(config).await;

    assert_eq!(records.len(), 5);
    assert_eq!(summary.items_saved, 5);
    let titles: Vec<_> = records.iter().filter_map(|r| r.title.as_deref()).collect();
    assert_eq!(titles, vec!["Job 1", "Job 2", "Job 3", "Job 4", "Job 5"]);
    assert_eq!(records[0].source, "kariyer.net");
    assert_eq!(records[0].date_posted.as_deref(), Some("2 gün önce"));
    assert_eq!(summary.pages(Stage::Detail), 0);
}

#[tokio::test]
async fn test_card_without_url_is_skipped() {
    let server = MockServer::start().await;
    let cards = vec![
        card("first-11", "First"),
        r#"<div data-test="ad-card"><span data-test="ad-card-title">No link</span></div>"#
            .to_string(),
        card("third-33", "Third"),
    ];
    mount_html(&server, "/is-ilanlari", listing_page(&cards, None)).await;

    let mut config = create_test_config(&server.uri());
    config.crawl.collect_details = false;

    let (_, records) = run(config).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title.as_deref(), Some("First"));
    assert_eq!(records[0].id.as_deref(), Some("11"));
    assert_eq!(records[1].title.as_deref(), Some("Third"));
}

#[tokio::test]
async fn test_detail_title_falls_back_to_heading() {
    let server = MockServer::start().await;
    let untitled = r#"<div data-test="ad-card">
            <a data-test="ad-card-link" href="/is-ilani/acme-rust-42">Detaylar</a>
        </div>"#
        .to_string();
    mount_html(&server, "/is-ilanlari", listing_page(&[untitled], None)).await;

    let detail = r#"<html><head>
        <script type="application/ld+json">
        {"@context": "https://schema.org", "@type": "JobPosting", "title": null,
         "hiringOrganization": {"@type": "Organization", "name": "Acme"},
         "datePosted": "2026-10-10",
         "description": "&lt;p&gt;Rust services&lt;/p&gt;"}
        </script></head>
        <body><h1>
            Senior   Rust
            Engineer
        </h1></body></html>"#;
    mount_html(&server, "/is-ilani/acme-rust-42", detail.to_string()).await;

    let config = create_test_config(&server.uri());
    let (summary, records) = run(config).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.title.as_deref(), Some("Senior Rust Engineer"));
    assert_eq!(record.company.as_deref(), Some("Acme"));
    assert_eq!(record.date_posted.as_deref(), Some("2026-10-10"));
    assert_eq!(record.description_text(), Some("Rust services"));
    assert_eq!(record.id.as_deref(), Some("42"));
    assert_eq!(summary.details_queued, 1);
}

#[tokio::test]
async fn test_details_drain_without_pagination() {
    let server = MockServer::start().await;
    let cards = vec![card("a-1", "Alpha"), card("b-2", "Beta"), card("c-3", "Gamma")];
    mount_html(&server, "/is-ilanlari", listing_page(&cards, None)).await;
    for (slug, title) in [("a-1", "Alpha"), ("b-2", "Beta"), ("c-3", "Gamma")] {
        mount_html(&server, &format!("/is-ilani/{}", slug), detail_page(title)).await;
    }

    let config = create_test_config(&server.uri());
    let (summary, records) = run(config).await;

    assert_eq!(records.len(), 3);
    assert_eq!(summary.pages(Stage::List), 1);
    assert_eq!(summary.count(Stage::Detail, PageOutcome::Processed), 3);
    for record in &records {
        assert_eq!(
            record.description_text(),
            Some("Build and run services.")
        );
    }
}

#[tokio::test]
async fn test_duplicates_across_pages_fetched_once() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/is-ilanlari",
        listing_page(&[card("a-1", "Alpha"), card("b-2", "Beta")], Some("/is-ilanlari/2")),
    )
    .await;
    mount_html(
        &server,
        "/is-ilanlari/2",
        listing_page(&[card("b-2", "Beta"), card("c-3", "Gamma")], None),
    )
    .await;

    for (slug, title) in [("a-1", "Alpha"), ("b-2", "Beta"), ("c-3", "Gamma")] {
        Mock::given(method("GET"))
            .and(path(format!("/is-ilani/{}", slug)))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(title)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = create_test_config(&server.uri());
    let (summary, records) = run(config).await;

    assert_eq!(records.len(), 3);
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(summary.pages(Stage::List), 2);
}

#[tokio::test]
async fn test_page_budget_limits_pagination() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/is-ilanlari",
        listing_page(&[card("a-1", "Alpha")], Some("/is-ilanlari/2")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/is-ilanlari/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[], None)))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.crawl.collect_details = false;
    config.crawl.max_pages = 1;

    let (summary, records) = run(config).await;

    assert_eq!(records.len(), 1);
    assert_eq!(summary.pages(Stage::List), 1);
}

#[tokio::test]
async fn test_blocked_detail_is_skipped() {
    let server = MockServer::start().await;
    let cards = vec![card("ok-1", "Fine"), card("walled-2", "Walled")];
    mount_html(&server, "/is-ilanlari", listing_page(&cards, None)).await;
    mount_html(&server, "/is-ilani/ok-1", detail_page("Fine")).await;
    mount_html(
        &server,
        "/is-ilani/walled-2",
        "<html><head><title>Just a moment...</title></head><body>Checking your browser</body></html>"
            .to_string(),
    )
    .await;

    let config = create_test_config(&server.uri());
    let (summary, records) = run(config).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("Fine"));
    assert_eq!(summary.blocked_pages(), 1);
    assert_eq!(summary.count(Stage::Detail, PageOutcome::Blocked), 1);
}

#[tokio::test]
async fn test_http_error_is_isolated() {
    let server = MockServer::start().await;
    let cards = vec![card("gone-1", "Gone"), card("here-2", "Here")];
    mount_html(&server, "/is-ilanlari", listing_page(&cards, None)).await;
    Mock::given(method("GET"))
        .and(path("/is-ilani/gone-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_html(&server, "/is-ilani/here-2", detail_page("Here")).await;

    let config = create_test_config(&server.uri());
    let (summary, records) = run(config).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("Here"));
    assert_eq!(summary.count(Stage::Detail, PageOutcome::HttpError), 1);
    assert!(!summary.terminated_early);
}

#[tokio::test]
async fn test_empty_listing_uses_anchor_parse() {
    let server = MockServer::start().await;
    let body = r#"<html><body><ul>
        <li><a href="/is-ilani/loose-7">Loose Markup Engineer</a> <span class="company">Beta AŞ</span></li>
        <li><a href="/hakkimizda">Hakkımızda</a></li>
    </ul></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/is-ilanlari"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.crawl.collect_details = false;

    let (summary, records) = run(config).await;

    assert_eq!(summary.secondary_parses, 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("Loose Markup Engineer"));
    assert_eq!(records[0].company.as_deref(), Some("Beta AŞ"));
}

#[tokio::test]
async fn test_api_listing_source() {
    let server = MockServer::start().await;
    let body = r#"{"data": {"pageCount": 1, "positions": [
        {"positionUrl": "/is-ilani/api-job-501", "title": "API Engineer",
         "companyName": "Gamma", "location": "İstanbul", "publishDate": "2026-10-18"},
        {"title": "No URL"}
    ]}}"#;
    Mock::given(method("GET"))
        .and(path("/search/positions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.crawl.listing_source = ListingSource::Api;
    config.crawl.start_urls = vec![format!("{}/search/positions?page=1", server.uri())];
    config.crawl.collect_details = false;

    let (_, records) = run(config).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("API Engineer"));
    assert_eq!(records[0].location.as_deref(), Some("İstanbul"));
    assert_eq!(records[0].id.as_deref(), Some("501"));
    assert!(records[0].url.ends_with("/is-ilani/api-job-501"));
}

#[tokio::test]
async fn test_request_ceiling_terminates_early() {
    let server = MockServer::start().await;
    let cards = vec![card("a-1", "Alpha"), card("b-2", "Beta")];
    mount_html(&server, "/is-ilanlari", listing_page(&cards, None)).await;
    Mock::given(method("GET"))
        .and(path("/is-ilani/a-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Alpha")))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.fetch.max_requests = Some(1);

    let (summary, records) = run(config).await;

    assert!(records.is_empty());
    assert!(summary.terminated_early);
    assert_eq!(summary.details_queued, 2);
    assert_eq!(summary.targets_dropped, 2);
}

#[tokio::test]
async fn test_refetch_respects_request_ceiling() {
    let server = MockServer::start().await;
    let body = r#"<html><body><ul>
        <li><a href="/is-ilani/loose-7">Loose Markup Engineer</a></li>
    </ul></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/is-ilanlari"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.crawl.collect_details = false;
    config.fetch.max_requests = Some(1);

    let (summary, records) = run(config).await;

    assert!(records.is_empty());
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.secondary_parses, 0);
    assert_eq!(summary.count(Stage::List, PageOutcome::Empty), 1);
}

#[tokio::test]
async fn test_time_ceiling_aborts_in_flight_details() {
    let server = MockServer::start().await;
    let cards = vec![card("slow-1", "Slow One"), card("slow-2", "Slow Two")];
    mount_html(&server, "/is-ilanlari", listing_page(&cards, None)).await;
    for slug in ["slow-1", "slow-2"] {
        Mock::given(method("GET"))
            .and(path(format!("/is-ilani/{}", slug)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(detail_page(slug))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&server.uri());
    config.fetch.timeout_secs = 30;
    config.fetch.max_run_seconds = Some(1);

    let (summary, records) = run(config).await;

    assert!(records.is_empty());
    assert!(summary.terminated_early);
    assert_eq!(summary.count(Stage::List, PageOutcome::Processed), 1);
    assert_eq!(summary.count(Stage::Detail, PageOutcome::Aborted), 2);
    assert!(summary.elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn test_stale_detail_is_discarded_after_merge() {
    let server = MockServer::start().await;
    let cards = vec![card("fresh-1", "Fresh"), card("stale-2", "Stale")];
    mount_html(&server, "/is-ilanlari", listing_page(&cards, None)).await;
    mount_html(&server, "/is-ilani/fresh-1", detail_page("Fresh")).await;

    let stale = r#"<html><head>
        <script type="application/ld+json">
        {"@type": "JobPosting", "title": "Stale", "datePosted": "2019-03-01"}
        </script></head><body><h1>Stale</h1></body></html>"#;
    mount_html(&server, "/is-ilani/stale-2", stale.to_string()).await;

    let mut config = create_test_config(&server.uri());
    config.crawl.age_window = AgeWindow::Last7d;

    let (summary, records) = run(config).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("Fresh"));
    assert_eq!(records[0].date_posted.as_deref(), Some("2 gün önce"));
    assert_eq!(summary.age_filtered, 1);
    assert_eq!(summary.count(Stage::Detail, PageOutcome::Processed), 2);
}

#[tokio::test]
async fn test_blocked_listing_does_not_paginate() {
    let server = MockServer::start().await;
    let walled = r#"<html><head><title>Just a moment...</title></head>
        <body>Checking your browser <a rel="next" href="/is-ilanlari/2">Sonraki</a></body></html>"#;
    mount_html(&server, "/is-ilanlari", walled.to_string()).await;
    Mock::given(method("GET"))
        .and(path("/is-ilanlari/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[], None)))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());
    let (summary, records) = run(config).await;

    assert!(records.is_empty());
    assert_eq!(summary.count(Stage::List, PageOutcome::Blocked), 1);
    assert_eq!(summary.pages(Stage::List), 1);
}

#[tokio::test]
async fn test_failed_listing_does_not_paginate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/is-ilanlari"))
        .respond_with(ResponseTemplate::new(503).set_body_string(listing_page(
            &[card("a-1", "Alpha")],
            Some("/is-ilanlari/2"),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/is-ilanlari/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[], None)))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());
    let (summary, records) = run(config).await;

    assert!(records.is_empty());
    assert_eq!(summary.details_queued, 0);
    assert_eq!(summary.count(Stage::List, PageOutcome::HttpError), 1);
}
