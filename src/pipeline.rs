use crate::config::ScraperConfig;
use crate::crawlers::PageSource;
use crate::error::{ConfigError, FetchError, ScrapeError};
use crate::export;
use crate::filter::LinkFilter;
use crate::parsers::{
    DetailSelectors, SummaryMatcher, discover_total_count, extract_details, extract_links,
};
use crate::progress::ProgressReporter;
use crate::results::{ErrorScope, ItemError, ProductRecord, RunResult, RunStatus};
use crate::utils::with_offset;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Shared stop request, checked between units of work
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    CollectingLinks,
    ExtractingDetails,
    Completed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::CollectingLinks => "collecting links",
            RunState::ExtractingDetails => "extracting details",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Product links gathered from the listing pages
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    pub links: BTreeSet<String>,
    pub total_count: usize,
    pub pages_visited: usize,
    pub errors: Vec<ItemError>,
    pub cancelled: bool,
}

/// Result of resolving one product link
#[derive(Debug, Clone)]
pub struct DetailOutcome {
    pub record: ProductRecord,
    pub error: Option<FetchError>,
}

/// Listing page URLs for `total` products, `page_size` per page, in
/// ascending offset order
pub fn build_page_sequence(listing_url: &str, total: usize, page_size: usize) -> Vec<String> {
    if page_size == 0 {
        return Vec::new();
    }

    (0..total.div_ceil(page_size))
        .map(|index| with_offset(listing_url, index * page_size))
        .collect()
}

/// Fetches a page, giving up after `limit`
pub async fn fetch_with_timeout(
    source: &dyn PageSource,
    url: &str,
    ready_selector: Option<&str>,
    limit: Duration,
) -> Result<String, FetchError> {
    match timeout(limit, source.fetch_page(url, ready_selector)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}

/// Fetches a detail page and extracts its record.
///
/// A fetch failure still yields a record (only `url` set) and hands the
/// error back so it can be reported.
pub async fn resolve_product(
    source: &dyn PageSource,
    url: &str,
    selectors: &DetailSelectors,
    ready_selector: Option<&str>,
    limit: Duration,
) -> DetailOutcome {
    match fetch_with_timeout(source, url, ready_selector, limit).await {
        Ok(html) => DetailOutcome {
            record: extract_details(&html, url, selectors),
            error: None,
        },
        Err(e) => {
            ::log::warn!("Failed to fetch product {}: {}", url, e);
            DetailOutcome {
                record: ProductRecord::unreachable(url),
                error: Some(e),
            }
        }
    }
}

/// Tracks the current state and reports each transition
struct RunTracker<'a> {
    state: RunState,
    progress: &'a dyn ProgressReporter,
}

impl<'a> RunTracker<'a> {
    fn new(progress: &'a dyn ProgressReporter) -> Self {
        Self {
            state: RunState::Idle,
            progress,
        }
    }

    fn enter(&mut self, next: RunState, completed: usize, total: usize, status: &str) {
        ::log::info!("Run state {} -> {}: {}", self.state, next, status);
        self.state = next;
        self.progress.report(completed, total, status);
    }
}

/// Collects product links from the listing and extracts every product
pub struct Pipeline {
    config: ScraperConfig,
    source: Arc<dyn PageSource>,
    filter: LinkFilter,
    summary: SummaryMatcher,
    selectors: Arc<DetailSelectors>,
    cancel: CancelFlag,
}

impl Pipeline {
    /// Validates the configuration and compiles its selectors and patterns
    pub fn new(config: ScraperConfig, source: Arc<dyn PageSource>) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            filter: LinkFilter::from_config(&config)?,
            summary: SummaryMatcher::from_config(&config.summary)?,
            selectors: Arc::new(DetailSelectors::from_config(&config.detail)?),
            config,
            source,
            cancel: CancelFlag::new(),
        })
    }

    /// Use an externally owned cancel flag
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Runs the whole pipeline and exports the records.
    ///
    /// Returns `Err` only for fatal conditions; per-page and per-product
    /// failures are listed in [`RunResult::errors`].
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunResult, ScrapeError> {
        let mut tracker = RunTracker::new(progress);

        match self.execute(&mut tracker).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracker.enter(RunState::Failed, 0, 0, &format!("Failed: {}", e));
                Err(e)
            }
        }
    }

    async fn execute(&self, tracker: &mut RunTracker<'_>) -> Result<RunResult, ScrapeError> {
        tracker.enter(RunState::CollectingLinks, 0, 0, "Collecting product links");
        let link_set = self.walk_listing(tracker.progress).await?;

        let mut result = RunResult {
            total_count: link_set.total_count,
            pages_visited: link_set.pages_visited,
            links_found: link_set.links.len(),
            errors: link_set.errors,
            ..RunResult::default()
        };

        if link_set.cancelled {
            result.status = RunStatus::Cancelled;
            tracker.enter(RunState::Completed, 0, 0, "Cancelled while collecting links");
            return Ok(result);
        }

        if link_set.links.is_empty() {
            result.status = RunStatus::NoProductsFound;
            tracker.enter(RunState::Completed, 0, 0, "No products found");
            return Ok(result);
        }

        let total = link_set.links.len();
        tracker.enter(
            RunState::ExtractingDetails,
            0,
            total,
            &format!("Extracting {} products", total),
        );
        self.extract_all(link_set.links, &mut result, tracker.progress)
            .await;

        if self.cancel.is_cancelled() {
            result.status = RunStatus::Cancelled;
        }

        if !result.records.is_empty() {
            let path = export::export(
                &result.records,
                &self.config.output_dir,
                self.config.export_format,
            )?;
            result.output = Some(path);
        }

        tracker.enter(
            RunState::Completed,
            result.records.len(),
            total,
            &result.summary(),
        );
        Ok(result)
    }

    /// Walks the listing pages and returns the deduplicated product links
    /// without visiting any product
    pub async fn collect_links(
        &self,
        progress: &dyn ProgressReporter,
    ) -> Result<LinkSet, ScrapeError> {
        self.walk_listing(progress).await
    }

    async fn walk_listing(&self, progress: &dyn ProgressReporter) -> Result<LinkSet, ScrapeError> {
        let listing_url = &self.config.listing_url;
        let ready = Some(self.config.listing_ready_selector.as_str());
        let limit = self.config.request_timeout();

        let first_url = with_offset(listing_url, 0);
        let first_page = fetch_with_timeout(self.source.as_ref(), &first_url, ready, limit)
            .await
            .map_err(ScrapeError::Discovery)?;

        let total_count = match discover_total_count(&first_page, &self.summary) {
            Some(total) => total,
            None => match self.config.fallback_total_count {
                Some(fallback) => {
                    ::log::warn!(
                        "No product count on {}, assuming {} products",
                        first_url,
                        fallback
                    );
                    fallback
                }
                None => return Err(ScrapeError::MissingTotalCount { url: first_url }),
            },
        };

        let pages = build_page_sequence(listing_url, total_count, self.config.page_size);
        ::log::info!(
            "Listing has {} products across {} pages",
            total_count,
            pages.len()
        );

        let mut link_set = LinkSet {
            total_count,
            pages_visited: 1,
            ..LinkSet::default()
        };
        link_set.links.extend(extract_links(&first_page, &self.filter));
        progress.report(
            1,
            pages.len().max(1),
            &format!("Read listing page 1/{}", pages.len().max(1)),
        );

        for (index, page_url) in pages.iter().enumerate().skip(1) {
            if self.cancel.is_cancelled() {
                ::log::info!("Cancellation requested, stopping listing walk");
                link_set.cancelled = true;
                break;
            }

            tokio::time::sleep(self.config.request_delay()).await;

            match fetch_with_timeout(self.source.as_ref(), page_url, ready, limit).await {
                Ok(html) => {
                    link_set.pages_visited += 1;
                    link_set.links.extend(extract_links(&html, &self.filter));
                }
                Err(e) => {
                    ::log::warn!("Skipping listing page {}: {}", page_url, e);
                    link_set
                        .errors
                        .push(ItemError::new(page_url, ErrorScope::ListingPage, e.to_string()));
                }
            }

            progress.report(
                index + 1,
                pages.len(),
                &format!("Read listing page {}/{}", index + 1, pages.len()),
            );
        }

        ::log::info!("Collected {} distinct product links", link_set.links.len());
        Ok(link_set)
    }

    /// Resolves every link on a bounded pool of workers
    async fn extract_all(
        &self,
        links: BTreeSet<String>,
        result: &mut RunResult,
        progress: &dyn ProgressReporter,
    ) {
        let total = links.len();
        let num_workers = self.config.max_concurrency.min(total).max(1);

        let (link_tx, link_rx) = mpsc::channel::<String>(total.max(1));
        for link in links {
            if link_tx.send(link).await.is_err() {
                break;
            }
        }
        drop(link_tx);

        let link_rx = Arc::new(Mutex::new(link_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<DetailOutcome>(num_workers * 2);

        let handles: Vec<JoinHandle<()>> = (0..num_workers)
            .map(|worker_id| {
                spawn_worker(
                    worker_id,
                    Arc::clone(&self.source),
                    Arc::clone(&self.selectors),
                    self.config.detail.ready_selector.clone(),
                    self.config.request_timeout(),
                    Arc::clone(&link_rx),
                    result_tx.clone(),
                    self.cancel.clone(),
                )
            })
            .collect();

        // Each worker holds its own sender; the channel closes when all are done
        drop(result_tx);

        let mut completed = 0;
        while let Some(outcome) = result_rx.recv().await {
            completed += 1;

            if let Some(error) = &outcome.error {
                result.errors.push(ItemError::new(
                    &outcome.record.url,
                    ErrorScope::Product,
                    error.to_string(),
                ));
            }

            progress.report(
                completed,
                total,
                &format!("Processed {}/{} products: {}", completed, total, outcome.record.url),
            );
            result.records.push(outcome.record);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                ::log::error!("Detail worker terminated abnormally: {}", e);
            }
        }

        result.records.sort_by(|a, b| a.url.cmp(&b.url));
    }
}

/// Spawns a single detail worker
///
/// The worker takes links from the shared queue until it is empty or a
/// cancellation is requested.
fn spawn_worker(
    worker_id: usize,
    source: Arc<dyn PageSource>,
    selectors: Arc<DetailSelectors>,
    ready_selector: String,
    limit: Duration,
    link_rx: Arc<Mutex<mpsc::Receiver<String>>>,
    result_tx: mpsc::Sender<DetailOutcome>,
    cancel: CancelFlag,
) -> JoinHandle<()> {
    ::log::trace!("Spawning worker {}", worker_id);

    tokio::spawn(async move {
        loop {
            if cancel.is_cancelled() {
                ::log::debug!("Worker {} stopping on cancellation", worker_id);
                break;
            }

            let next = link_rx.lock().await.recv().await;
            let Some(url) = next else {
                break;
            };
            ::log::trace!("Worker {} processing: {}", worker_id, url);

            let outcome = resolve_product(
                source.as_ref(),
                &url,
                &selectors,
                Some(ready_selector.as_str()),
                limit,
            )
            .await;

            if let Err(e) = result_tx.send(outcome).await {
                ::log::error!("Worker {} failed to send result: {}", worker_id, e);
                break;
            }
        }

        ::log::debug!("Worker {} completed processing loop", worker_id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::tempdir;

    const LISTING: &str = "https://shop.test/pe/productos?sort=new";

    /// Serves canned pages; anything unknown is a 404
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, String>,
        failures: HashMap<String, FetchError>,
        hang: Vec<String>,
        latency: Option<Duration>,
        requests: std::sync::Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn failing(mut self, url: &str, error: FetchError) -> Self {
            self.failures.insert(url.to_string(), error);
            self
        }

        fn hanging(mut self, url: &str) -> Self {
            self.hang.push(url.to_string());
            self
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_page(
            &self,
            url: &str,
            _ready_selector: Option<&str>,
        ) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            if self.hang.iter().any(|u| u == url) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if let Some(error) = self.failures.get(url) {
                return Err(error.clone());
            }
            self.pages.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn listing_page(summary: &str, slugs: &[&str]) -> String {
        let cards: String = slugs
            .iter()
            .map(|slug| {
                format!(
                    r#"<div class="productoItem"><a href="/pe/producto/{}">x</a></div>"#,
                    slug
                )
            })
            .collect();
        format!("<html><body><p>{}</p>{}</body></html>", summary, cards)
    }

    fn product_page(name: &str) -> String {
        format!(
            r#"<html><body><h1>{}</h1><div class="text-left">S/ 99.90</div></body></html>"#,
            name
        )
    }

    fn product_url(slug: &str) -> String {
        format!("https://shop.test/pe/producto/{}", slug)
    }

    fn test_config(output_dir: &std::path::Path) -> ScraperConfig {
        ScraperConfig {
            listing_url: LISTING.to_string(),
            site_base_url: "https://shop.test".to_string(),
            page_size: 2,
            request_delay_ms: 0,
            request_timeout_secs: 1,
            max_concurrency: 3,
            output_dir: output_dir.to_path_buf(),
            ..ScraperConfig::default()
        }
    }

    fn files_in(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_page_sequence_counts_and_offsets() {
        for page_size in 1..=7 {
            for total in 0..=40 {
                let pages = build_page_sequence(LISTING, total, page_size);
                assert_eq!(pages.len(), total.div_ceil(page_size));
                for (index, url) in pages.iter().enumerate() {
                    assert!(url.ends_with(&format!("&start={}", index * page_size)));
                }
            }
        }
    }

    #[test]
    fn test_page_sequence_example() {
        let pages = build_page_sequence(LISTING, 656, 48);
        assert_eq!(pages.len(), 14);
        assert_eq!(pages[0], format!("{}&start=0", LISTING));
        assert_eq!(pages[13], format!("{}&start=624", LISTING));
        assert!(build_page_sequence(LISTING, 10, 0).is_empty());
    }

    #[tokio::test]
    async fn test_full_run() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default()
            .page(
                &format!("{}&start=0", LISTING),
                &listing_page("1 - 2 de 3 productos", &["a", "b"]),
            )
            .page(
                &format!("{}&start=2", LISTING),
                &listing_page("3 - 3 de 3 productos", &["b", "c"]),
            )
            .page(&product_url("a"), &product_page("Zapatilla A"))
            .page(&product_url("b"), &product_page("Zapatilla B"))
            .failing(
                &product_url("c"),
                FetchError::Timeout {
                    url: product_url("c"),
                    seconds: 10,
                },
            );
        let source = Arc::new(source);

        let pipeline = Pipeline::new(test_config(dir.path()), source.clone()).unwrap();
        let updates = std::sync::Mutex::new(Vec::new());
        let progress = |done: usize, total: usize, status: &str| {
            updates.lock().unwrap().push((done, total, status.to_string()));
        };

        let result = pipeline.run(&progress).await.unwrap();

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.pages_visited, 2);
        assert_eq!(result.links_found, 3);
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.successful(), 2);
        assert_eq!(result.errored(), 1);

        let urls: Vec<&str> = result.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec![product_url("a"), product_url("b"), product_url("c")]);
        assert_eq!(result.records[2], ProductRecord::unreachable(&product_url("c")));

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].url, product_url("c"));
        assert_eq!(result.errors[0].scope, ErrorScope::Product);

        // "b" appears on both listing pages but is fetched once
        let fetches_of_b = source
            .requested()
            .iter()
            .filter(|u| **u == product_url("b"))
            .count();
        assert_eq!(fetches_of_b, 1);

        let output = result.output.clone().unwrap();
        assert!(output.exists());
        assert_eq!(files_in(dir.path()), 1);

        let updates = updates.lock().unwrap();
        let per_item: Vec<usize> = updates
            .iter()
            .filter(|(_, total, status)| *total == 3 && status.starts_with("Processed"))
            .map(|(done, _, _)| *done)
            .collect();
        assert_eq!(per_item, vec![1, 2, 3]);
        assert_eq!(updates.last().unwrap().2, result.summary());
    }

    #[tokio::test]
    async fn test_first_page_unreachable_is_fatal() {
        let dir = tempdir().unwrap();
        let pipeline =
            Pipeline::new(test_config(dir.path()), Arc::new(FakeSource::default())).unwrap();

        let result = pipeline.run(&NoProgress).await;
        assert!(matches!(
            result,
            Err(ScrapeError::Discovery(FetchError::Status { status: 404, .. }))
        ));
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_listing_page_failure_is_recorded() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default()
            .page(
                &format!("{}&start=0", LISTING),
                &listing_page("1 - 2 de 4 productos", &["a"]),
            )
            .page(&product_url("a"), &product_page("Zapatilla A"));

        let pipeline = Pipeline::new(test_config(dir.path()), Arc::new(source)).unwrap();
        let result = pipeline.run(&NoProgress).await.unwrap();

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.pages_visited, 1);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].scope, ErrorScope::ListingPage);
        assert_eq!(result.errors[0].url, format!("{}&start=2", LISTING));
    }

    #[tokio::test]
    async fn test_no_links_found() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default().page(
            &format!("{}&start=0", LISTING),
            &listing_page("0 de 0 productos", &[]),
        );

        let pipeline = Pipeline::new(test_config(dir.path()), Arc::new(source)).unwrap();
        let result = pipeline.run(&NoProgress).await.unwrap();

        assert_eq!(result.status, RunStatus::NoProductsFound);
        assert!(result.records.is_empty());
        assert!(result.output.is_none());
        assert_eq!(files_in(dir.path()), 0);
        assert_eq!(result.summary(), "No products found");
    }

    #[tokio::test]
    async fn test_missing_count_uses_fallback() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default()
            .page(&format!("{}&start=0", LISTING), &listing_page("", &["a"]))
            .page(&format!("{}&start=2", LISTING), &listing_page("", &["b"]))
            .page(&product_url("a"), &product_page("A"))
            .page(&product_url("b"), &product_page("B"));
        let source = Arc::new(source);

        let config = ScraperConfig {
            fallback_total_count: Some(4),
            ..test_config(dir.path())
        };
        let pipeline = Pipeline::new(config, source.clone()).unwrap();
        let links = pipeline.collect_links(&NoProgress).await.unwrap();

        assert_eq!(links.total_count, 4);
        assert_eq!(links.pages_visited, 2);
        assert_eq!(links.links.len(), 2);
        assert!(source.requested().iter().all(|u| u.starts_with(LISTING)));
    }

    #[tokio::test]
    async fn test_missing_count_without_fallback_is_fatal() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default()
            .page(&format!("{}&start=0", LISTING), &listing_page("", &["a"]));

        let config = ScraperConfig {
            fallback_total_count: None,
            ..test_config(dir.path())
        };
        let pipeline = Pipeline::new(config, Arc::new(source)).unwrap();

        let result = pipeline.run(&NoProgress).await;
        assert!(matches!(result, Err(ScrapeError::MissingTotalCount { .. })));
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_hanging_product_times_out() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default()
            .page(
                &format!("{}&start=0", LISTING),
                &listing_page("1 - 2 de 2 productos", &["a", "slow"]),
            )
            .page(&product_url("a"), &product_page("A"))
            .hanging(&product_url("slow"));

        let pipeline = Pipeline::new(test_config(dir.path()), Arc::new(source)).unwrap();
        let result = pipeline.run(&NoProgress).await.unwrap();

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.successful(), 1);
        assert_eq!(result.errored(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].reason.contains("timed out"));
        assert!(result.output.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_before_details() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default()
            .page(
                &format!("{}&start=0", LISTING),
                &listing_page("1 - 2 de 4 productos", &["a", "b"]),
            )
            .page(&product_url("a"), &product_page("A"))
            .page(&product_url("b"), &product_page("B"));
        let source = Arc::new(source);

        let cancel = CancelFlag::new();
        let pipeline = Pipeline::new(test_config(dir.path()), source.clone())
            .unwrap()
            .with_cancel_flag(cancel.clone());
        cancel.cancel();

        let result = pipeline.run(&NoProgress).await.unwrap();

        assert_eq!(result.status, RunStatus::Cancelled);
        assert!(result.records.is_empty());
        assert!(result.output.is_none());
        assert_eq!(source.requested().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_during_details_keeps_records() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default()
            .page(
                &format!("{}&start=0", LISTING),
                &listing_page("1 - 3 de 3 productos", &["a", "b", "c"]),
            )
            .page(&product_url("a"), &product_page("A"))
            .page(&product_url("b"), &product_page("B"))
            .page(&product_url("c"), &product_page("C"))
            .with_latency(Duration::from_millis(50));

        let config = ScraperConfig {
            page_size: 3,
            max_concurrency: 1,
            ..test_config(dir.path())
        };
        let cancel = CancelFlag::new();
        let pipeline = Pipeline::new(config, Arc::new(source))
            .unwrap()
            .with_cancel_flag(cancel.clone());

        let progress = |_done: usize, _total: usize, status: &str| {
            if status.starts_with("Processed 1/") {
                cancel.cancel();
            }
        };
        let result = pipeline.run(&progress).await.unwrap();

        assert_eq!(result.status, RunStatus::Cancelled);
        assert_eq!(result.links_found, 3);
        assert!(!result.records.is_empty());
        assert!(result.records.len() < result.links_found);
        assert!(result.records.iter().all(|r| r.name.is_some()));
        assert!(result.output.is_some());
        assert_eq!(files_in(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let dir = tempdir().unwrap();
        let config = ScraperConfig {
            max_concurrency: 0,
            ..test_config(dir.path())
        };
        assert!(Pipeline::new(config, Arc::new(FakeSource::default())).is_err());
    }
}
