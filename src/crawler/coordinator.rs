//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the two-stage crawl loop:
//! - Seeding listing targets from the configured start URLs
//! - Dispatching targets to a bounded set of worker tasks
//! - Applying dedupe, age filtering and budget checks to worker results
//! - Emitting records to the sink and following pagination
//! - Enforcing the run's time and request ceilings
//!
//! Workers only fetch and extract. Every decision that touches the budget,
//! the seen sets or the sink happens here, on the coordinating task.

use crate::config::{derive_start_urls, site_base, validate, Config, ListingSource};
use crate::crawler::fetcher::{FetchError, FetchRequest, FetchResponse, Fetcher, ReqwestFetcher};
use crate::crawler::headers::{BrowserHeaderGenerator, DeviceProfile, HeaderProfileGenerator};
use crate::crawler::proxy::{ProxyProvider, RotatingProxyPool};
use crate::crawler::scheduler::{Pacing, ScheduledTarget, Scheduler};
use crate::extract::{
    extract_api_listing, extract_detail, extract_listing, extract_listing_by_anchor, ListingPage,
};
use crate::filter::{detect_block, is_within_age, AgeWindow};
use crate::job::{CrawlTarget, JobRecord, PartialJobRecord};
use crate::output::{ItemSink, JsonLinesSink, RunSummary};
use crate::state::{CrawlBudget, PageOutcome, SeenSet, Stage};
use crate::{HarvestError, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// The pluggable pieces a coordinator drives
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub headers: Arc<dyn HeaderProfileGenerator>,
    pub proxies: Arc<dyn ProxyProvider>,
    pub sink: Box<dyn ItemSink>,
}

impl Collaborators {
    /// Builds the shipped implementations from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Collaborators)` - HTTP client built and output file opened
    /// * `Err(HarvestError)` - Client construction or sink open failed
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = ReqwestFetcher::from_config(&config.fetch)?;
        let sink = JsonLinesSink::open(Path::new(&config.output.path))?;

        Ok(Self {
            fetcher: Arc::new(fetcher),
            headers: Arc::new(BrowserHeaderGenerator),
            proxies: Arc::new(RotatingProxyPool::from_config(&config.proxy)),
            sink: Box::new(sink),
        })
    }
}

/// How a worker finished one target
#[derive(Debug)]
enum TargetOutcome {
    /// Listing fetched and parsed (possibly to zero cards)
    Listing {
        page: ListingPage,
        secondary_used: bool,
    },

    /// Detail fetched and extracted
    Detail { record: PartialJobRecord },

    /// Body matched an anti-bot marker
    Blocked { marker: &'static str },

    /// Final response had status 400 or above
    HttpFailed { status: u16 },

    /// Timeout or connection failure after retries
    FetchFailed { error: FetchError },
}

impl TargetOutcome {
    fn page_outcome(&self) -> PageOutcome {
        match self {
            Self::Listing { page, .. } if page.cards.is_empty() => PageOutcome::Empty,
            Self::Listing { .. } | Self::Detail { .. } => PageOutcome::Processed,
            Self::Blocked { .. } => PageOutcome::Blocked,
            Self::HttpFailed { .. } => PageOutcome::HttpError,
            Self::FetchFailed { .. } => PageOutcome::NetworkError,
        }
    }
}

/// What a worker task hands back to the coordinator
struct WorkerReport {
    task_id: u64,
    target: CrawlTarget,
    outcome: TargetOutcome,
}

/// Read-only state shared by all worker tasks
struct WorkerContext {
    fetcher: Arc<dyn Fetcher>,
    headers: Arc<dyn HeaderProfileGenerator>,
    proxies: Arc<dyn ProxyProvider>,
    pacing: Pacing,
    timeout: Duration,
    locale: String,
    referer: Option<String>,
    listing_source: ListingSource,
    site_base: Url,
    secondary_parse: bool,
}

impl WorkerContext {
    async fn pause(&self) {
        let delay = self.pacing.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Fetches a URL under a fresh identity and applies the failure gates
    ///
    /// HTTP errors are checked before the block detector. A block page
    /// counts as a strike against the proxy that served it.
    async fn fetch_gated(&self, url: &Url) -> std::result::Result<FetchResponse, TargetOutcome> {
        let proxy = self.proxies.new_proxy_url();
        let profile = DeviceProfile::random(&self.locale, self.referer.as_deref());
        let request = FetchRequest {
            url: url.clone(),
            proxy: proxy.clone(),
            headers: self.headers.headers(&profile),
            timeout: self.timeout,
        };

        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|error| TargetOutcome::FetchFailed { error })?;

        if response.status_code >= 400 {
            return Err(TargetOutcome::HttpFailed {
                status: response.status_code,
            });
        }

        if let Some(marker) = detect_block(&response.body) {
            if let Some(proxy) = &proxy {
                self.proxies.report_blocked(proxy);
            }
            return Err(TargetOutcome::Blocked { marker });
        }

        Ok(response)
    }

    /// Parses a listing response
    ///
    /// An HTML page with no cards is fetched once more under a new identity
    /// and scanned for job anchors, when `allow_refetch` permits it.
    async fn process_listing(
        &self,
        url: &Url,
        response: FetchResponse,
        allow_refetch: bool,
    ) -> TargetOutcome {
        if self.listing_source == ListingSource::Api {
            let page = extract_api_listing(&response.body, &response.final_url, &self.site_base)
                .unwrap_or_else(|e| {
                    tracing::warn!("Unreadable API response from {}: {}", url, e);
                    ListingPage::default()
                });
            return TargetOutcome::Listing {
                page,
                secondary_used: false,
            };
        }

        let page = extract_listing(&response.body, &response.final_url);
        if !page.cards.is_empty() || !allow_refetch {
            if page.cards.is_empty() && self.secondary_parse {
                tracing::debug!("No cards on {}, request ceiling leaves no room to refetch", url);
            }
            return TargetOutcome::Listing {
                page,
                secondary_used: false,
            };
        }

        tracing::debug!("No cards on {}, refetching with a fresh identity", url);
        self.pause().await;
        let page = match self.fetch_gated(url).await {
            Ok(retry) => extract_listing_by_anchor(&retry.body, &retry.final_url),
            Err(outcome) => {
                tracing::debug!(
                    "Refetch of {} failed ({}), keeping the empty parse",
                    url,
                    outcome.page_outcome()
                );
                page
            }
        };

        TargetOutcome::Listing {
            page,
            secondary_used: true,
        }
    }
}

/// Pacing, fetch, block check and extraction for one target
async fn process_target(
    ctx: &WorkerContext,
    target: &CrawlTarget,
    allow_refetch: bool,
) -> TargetOutcome {
    ctx.pause().await;

    let response = match ctx.fetch_gated(&target.url).await {
        Ok(response) => response,
        Err(outcome) => return outcome,
    };

    match target.stage {
        Stage::Detail => TargetOutcome::Detail {
            record: extract_detail(&response.body, &response.final_url),
        },
        Stage::List => ctx.process_listing(&target.url, response, allow_refetch).await,
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    ctx: Arc<WorkerContext>,
    sink: Box<dyn ItemSink>,
    scheduler: Scheduler,
    budget: CrawlBudget,

    /// Detail (or listing-only record) URLs already scheduled
    seen: SeenSet,

    /// Listing URLs already scheduled, always enforced
    listing_seen: SeenSet,

    summary: RunSummary,
    collect_details: bool,
    age_window: AgeWindow,
    max_run: Option<Duration>,
    max_requests: Option<u64>,

    /// Stage of every dispatched target that has not reported back
    in_flight: HashMap<u64, Stage>,

    /// In-flight listings holding a request for a possible refetch
    refetch_reserved: HashSet<u64>,
    next_task_id: u64,
}

impl Coordinator {
    /// Creates a new coordinator and seeds the frontier
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    /// * `collaborators` - Fetcher, header generator, proxy provider and sink
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, with at least one listing target
    /// * `Err(HarvestError)` - Invalid configuration or no start URL
    pub fn new(config: Config, collaborators: Collaborators) -> Result<Self> {
        validate(&config)?;

        let start_urls = derive_start_urls(&config.crawl)?;
        if start_urls.is_empty() {
            return Err(HarvestError::NoStartUrl);
        }

        let crawl = &config.crawl;
        let ctx = WorkerContext {
            fetcher: collaborators.fetcher,
            headers: collaborators.headers,
            proxies: collaborators.proxies,
            pacing: Pacing::new(config.fetch.min_delay_ms, config.fetch.max_delay_ms),
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            locale: config.fetch.locale.clone(),
            referer: config.fetch.referer.clone(),
            listing_source: crawl.listing_source,
            site_base: site_base(crawl)?,
            secondary_parse: crawl.secondary_parse,
        };

        let mut coordinator = Self {
            ctx: Arc::new(ctx),
            sink: collaborators.sink,
            scheduler: Scheduler::new(crawl.concurrency as usize),
            budget: CrawlBudget::new(crawl.effective_target_count(), crawl.max_pages),
            seen: SeenSet::new(crawl.dedupe),
            listing_seen: SeenSet::new(true),
            summary: RunSummary::new(None),
            collect_details: crawl.collect_details,
            age_window: crawl.age_window,
            max_run: config.fetch.max_run_seconds.map(Duration::from_secs),
            max_requests: config.fetch.max_requests,
            in_flight: HashMap::new(),
            refetch_reserved: HashSet::new(),
            next_task_id: 0,
        };

        for url in start_urls {
            if !coordinator.listing_seen.should_enqueue(&url) {
                continue;
            }
            if !coordinator.budget.try_reserve_page() {
                tracing::warn!(
                    "Page budget of {} is smaller than the start URL list, skipping {}",
                    coordinator.budget.max_pages(),
                    url
                );
                continue;
            }
            coordinator.scheduler.push(CrawlTarget::list(url, 1));
        }

        Ok(coordinator)
    }

    /// Records the configuration hash in the run summary
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.summary.config_hash = Some(hash.into());
        self
    }

    /// Runs the crawl to completion
    ///
    /// The loop ends when the frontier is empty and no worker is running.
    /// Reaching the target count drops pending targets and lets in-flight
    /// work drain; the time ceiling aborts in-flight work instead.
    pub async fn run(mut self) -> Result<RunSummary> {
        let started = Instant::now();
        let deadline = self.max_run.map(|d| tokio::time::Instant::now() + d);
        let mut workers: JoinSet<WorkerReport> = JoinSet::new();
        let mut finished: u64 = 0;

        tracing::info!(
            "Starting crawl: {} start URL(s), target {}, {} mode",
            self.scheduler.frontier_size(),
            self.budget
                .target_count()
                .map_or("unbounded".to_string(), |t| t.to_string()),
            if self.collect_details { "detail" } else { "listing-only" }
        );

        loop {
            self.dispatch(&mut workers);

            if workers.is_empty() {
                break;
            }

            let joined = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, workers.join_next()).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            tracing::warn!(
                                "Run time ceiling reached, aborting {} in-flight targets",
                                workers.len()
                            );
                            self.summary.terminated_early = true;
                            self.summary.targets_dropped += self.scheduler.clear() as u64;
                            workers.abort_all();
                            break;
                        }
                    }
                }
                None => workers.join_next().await,
            };

            match joined {
                Some(Ok(report)) => {
                    self.handle_report(report)?;
                    finished += 1;

                    if finished % 10 == 0 {
                        let rate =
                            finished as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
                        tracing::info!(
                            "Progress: {} pages done, {} items saved, {} in frontier, {:.2} pages/sec",
                            finished,
                            self.budget.items_saved(),
                            self.scheduler.frontier_size(),
                            rate
                        );
                    }
                }
                Some(Err(e)) => tracing::error!("Worker task failed: {}", e),
                None => break,
            }

            if self.budget.is_satisfied() && !self.scheduler.is_empty() {
                let dropped = self.scheduler.clear();
                tracing::info!("Target count reached, dropping {} pending targets", dropped);
                self.summary.targets_dropped += dropped as u64;
            }
        }

        // Aborted tasks still have to be reaped before their stages are counted
        while workers.join_next().await.is_some() {}
        for (_, stage) in self.in_flight.drain() {
            self.summary.record(stage, PageOutcome::Aborted);
        }
        self.refetch_reserved.clear();

        self.sink.flush()?;

        self.summary.items_saved = self.budget.items_saved();
        self.summary.details_queued = self.budget.details_queued();
        self.summary.elapsed = started.elapsed();

        tracing::info!(
            "Crawl completed: {} items saved from {} pages in {:?}{}",
            self.summary.items_saved,
            self.summary.total_pages(),
            self.summary.elapsed,
            if self.summary.terminated_early { " (terminated early)" } else { "" }
        );

        Ok(self.summary)
    }

    /// Starts workers until the frontier is empty or every slot is taken
    fn dispatch(&mut self, workers: &mut JoinSet<WorkerReport>) {
        loop {
            if self.scheduler.is_empty() {
                return;
            }

            let requests = self.summary.requests;
            if let Some(max) = self.max_requests.filter(|max| requests >= *max) {
                let dropped = self.scheduler.clear();
                tracing::warn!(
                    "Request ceiling of {} reached, dropping {} pending targets",
                    max,
                    dropped
                );
                self.summary.terminated_early = true;
                self.summary.targets_dropped += dropped as u64;
                return;
            }

            // Held refetch requests are released when their listing reports
            if self
                .max_requests
                .is_some_and(|max| self.committed_requests() >= max)
            {
                return;
            }

            let Some(scheduled) = self.scheduler.try_next() else {
                return;
            };

            if scheduled.target.stage == Stage::List
                && !self.budget.wants_more_listings(self.collect_details)
            {
                tracing::debug!("Enough items collected, skipping {}", scheduled.target.url);
                self.summary.targets_dropped += 1;
                continue;
            }

            self.spawn_worker(workers, scheduled);
        }
    }

    /// Requests issued plus those held for listing refetches
    fn committed_requests(&self) -> u64 {
        self.summary.requests + self.refetch_reserved.len() as u64
    }

    /// Whether a listing dispatched now may spend a second request
    fn may_refetch(&self, stage: Stage) -> bool {
        stage == Stage::List
            && self.ctx.secondary_parse
            && self.ctx.listing_source == ListingSource::Html
            && self
                .max_requests
                .map_or(true, |max| self.committed_requests() < max)
    }

    fn spawn_worker(&mut self, workers: &mut JoinSet<WorkerReport>, scheduled: ScheduledTarget) {
        let task_id = self.next_task_id;
        self.next_task_id += 1;
        self.in_flight.insert(task_id, scheduled.target.stage);
        self.summary.requests += 1;

        let allow_refetch = self.may_refetch(scheduled.target.stage);
        if allow_refetch {
            self.refetch_reserved.insert(task_id);
        }

        let ctx = Arc::clone(&self.ctx);
        workers.spawn(async move {
            let ScheduledTarget { target, permit } = scheduled;
            let outcome = process_target(&ctx, &target, allow_refetch).await;
            drop(permit);
            WorkerReport {
                task_id,
                target,
                outcome,
            }
        });
    }

    fn handle_report(&mut self, report: WorkerReport) -> Result<()> {
        let WorkerReport {
            task_id,
            target,
            outcome,
        } = report;
        self.in_flight.remove(&task_id);
        self.refetch_reserved.remove(&task_id);
        self.summary.record(target.stage, outcome.page_outcome());

        match outcome {
            TargetOutcome::Listing {
                page,
                secondary_used,
            } => {
                if secondary_used {
                    self.summary.secondary_parses += 1;
                    self.summary.requests += 1;
                }
                self.handle_listing(&target, page)
            }
            TargetOutcome::Detail { record } => self.handle_detail(target, record),
            TargetOutcome::Blocked { marker } => {
                tracing::warn!(
                    "Blocked {} page {} (matched \"{}\"), skipping",
                    target.stage,
                    target.url,
                    marker
                );
                Ok(())
            }
            TargetOutcome::HttpFailed { status } => {
                tracing::warn!(
                    "HTTP {} for {} page {}, skipping",
                    status,
                    target.stage,
                    target.url
                );
                Ok(())
            }
            TargetOutcome::FetchFailed { error } => {
                tracing::warn!("Fetch failed for {} page {}: {}", target.stage, target.url, error);
                Ok(())
            }
        }
    }

    /// Applies cards from one listing page, then follows pagination
    fn handle_listing(&mut self, target: &CrawlTarget, page: ListingPage) -> Result<()> {
        let page_number = target.page_number.unwrap_or(1);
        let card_count = page.cards.len();
        tracing::debug!(
            "Listing page {} ({}) yielded {} cards",
            page_number,
            target.url,
            card_count
        );

        for card in page.cards {
            if !self.budget.wants_more_listings(self.collect_details) {
                tracing::debug!("Target reached mid-page on {}", target.url);
                break;
            }

            let Some(url) = card.url.as_deref().and_then(|u| Url::parse(u).ok()) else {
                self.summary.cards_without_url += 1;
                continue;
            };

            if !is_within_age(card.date_posted.as_deref(), self.age_window) {
                tracing::debug!("Card {} is outside the {} window", url, self.age_window.as_str());
                self.summary.age_filtered += 1;
                continue;
            }

            if !self.seen.should_enqueue(&url) {
                tracing::debug!("Already scheduled: {}", url);
                self.summary.duplicates_skipped += 1;
                continue;
            }

            if self.collect_details {
                if !self.budget.try_queue_detail() {
                    break;
                }
                self.scheduler.push(CrawlTarget::detail(url, card));
            } else {
                if !self.budget.try_save_item() {
                    break;
                }
                self.emit(card, &url)?;
            }
        }

        if card_count == 0 {
            tracing::info!("No cards on {}, ending this listing lineage", target.url);
            return Ok(());
        }

        let Some(next) = page.next_page else {
            tracing::debug!("No next page after {}", target.url);
            return Ok(());
        };

        if !self.budget.wants_more_listings(self.collect_details) {
            return Ok(());
        }
        if !self.listing_seen.should_enqueue(&next) {
            tracing::debug!("Next page {} was already scheduled", next);
            return Ok(());
        }
        if !self.budget.try_reserve_page() {
            tracing::info!("Page budget of {} exhausted", self.budget.max_pages());
            return Ok(());
        }

        self.scheduler.push(CrawlTarget::list(next, page_number + 1));
        Ok(())
    }

    /// Merges a detail extraction into its card and emits it
    fn handle_detail(&mut self, target: CrawlTarget, detail: PartialJobRecord) -> Result<()> {
        let merged = target.carried.unwrap_or_default().merge_detail(detail);

        if !is_within_age(merged.date_posted.as_deref(), self.age_window) {
            tracing::debug!(
                "Detail {} is outside the {} window",
                target.url,
                self.age_window.as_str()
            );
            self.summary.age_filtered += 1;
            return Ok(());
        }

        if !self.budget.try_save_item() {
            tracing::debug!("Target reached, discarding {}", target.url);
            return Ok(());
        }

        self.emit(merged, &target.url)
    }

    fn emit(&mut self, partial: PartialJobRecord, url: &Url) -> Result<()> {
        let record = JobRecord::from_partial(partial, url, Utc::now());
        self.sink.push(&record)?;
        tracing::debug!(
            "Saved {} ({}/{})",
            record.url,
            self.budget.items_saved(),
            self.budget
                .target_count()
                .map_or("-".to_string(), |t| t.to_string())
        );
        Ok(())
    }
}

/// Runs a complete crawl with the shipped collaborators
///
/// # Arguments
///
/// * `config` - The validated crawl configuration
/// * `config_hash` - Hash of the config file, recorded in the summary
///
/// # Example
///
/// ```no_run
/// use kariyer_harvest::config::load_config_with_hash;
/// use kariyer_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("harvest.toml"))?;
/// let summary = run_crawl(config, Some(hash)).await?;
/// println!("{} items", summary.items_saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: Option<String>) -> Result<RunSummary> {
    let collaborators = Collaborators::from_config(&config)?;
    let mut coordinator = Coordinator::new(config, collaborators)?;
    if let Some(hash) = config_hash {
        tracing::info!("Config hash: {}", hash);
        coordinator = coordinator.with_config_hash(hash);
    }
    coordinator.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use crate::output::MemorySink;
    use async_trait::async_trait;

    /// Fetcher that must never be called
    struct NoFetch;

    #[async_trait]
    impl Fetcher for NoFetch {
        async fn fetch(
            &self,
            request: FetchRequest,
        ) -> std::result::Result<FetchResponse, FetchError> {
            Err(FetchError::Client(format!("unexpected fetch of {}", request.url)))
        }
    }

    fn collaborators() -> Collaborators {
        Collaborators {
            fetcher: Arc::new(NoFetch),
            headers: Arc::new(BrowserHeaderGenerator),
            proxies: Arc::new(RotatingProxyPool::new(Vec::new(), 3)),
            sink: Box::new(MemorySink::new()),
        }
    }

    #[test]
    fn test_no_start_url_fails_before_fetch() {
        let config = Config {
            crawl: CrawlConfig {
                base_url: String::new(),
                ..Default::default()
            },
            ..Default::default()
        };

        let result = Coordinator::new(config, collaborators());
        assert!(matches!(result, Err(HarvestError::NoStartUrl)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.crawl.concurrency = 0;
        assert!(matches!(
            Coordinator::new(config, collaborators()),
            Err(HarvestError::Config(_))
        ));
    }

    #[test]
    fn test_start_urls_seeded_within_page_budget() {
        let mut config = Config::default();
        config.crawl.start_urls = vec![
            "https://www.kariyer.net/is-ilanlari?kw=rust".to_string(),
            "https://www.kariyer.net/is-ilanlari?kw=go".to_string(),
            "https://www.kariyer.net/is-ilanlari?kw=rust".to_string(),
        ];
        config.crawl.max_pages = 1;

        let coordinator = Coordinator::new(config, collaborators()).unwrap();
        assert_eq!(coordinator.scheduler.frontier_size(), 1);
        assert_eq!(coordinator.budget.pages_visited(), 1);
    }

    #[test]
    fn test_outcome_classification() {
        let empty = TargetOutcome::Listing {
            page: ListingPage::default(),
            secondary_used: true,
        };
        assert_eq!(empty.page_outcome(), PageOutcome::Empty);
        assert_eq!(
            TargetOutcome::Blocked { marker: "cloudflare" }.page_outcome(),
            PageOutcome::Blocked
        );
        assert_eq!(
            TargetOutcome::HttpFailed { status: 503 }.page_outcome(),
            PageOutcome::HttpError
        );
    }
}
