//! Archive crawl loop.
//!
//! The crawler walks listing pages `start_page..=end_page` and runs every
//! article it discovers through the pipeline:
//!
//! ```text
//! listing page ─► extract_listing ─► ArticleTask ─► fetch article page
//!                                                    │
//!     store ◄─ StoredDocument ◄─ enrich ◄─ parse_article_page
//! ```
//!
//! Work is driven by an explicit FIFO queue of [`CrawlTask`]s. Processing a
//! listing page pushes one [`ArticleTask`] per teaser (carrying the partial
//! record), then the next listing page. Consecutive article tasks are run
//! together with up to `concurrency` in flight.
//!
//! # Pagination
//!
//! [`CrawlState`] owns the page counter. After a listing page is processed
//! the counter advances; once it passes `end_page` the crawl stops normally.
//! A failed listing fetch is retried with the next page number after a
//! backoff, at most `page_retries` times; after that the crawl fails with
//! [`CrawlError::ListingUnavailable`].
//!
//! # Per-article failures
//!
//! A failed article fetch or store write is logged and counted; the crawl
//! carries on with the next article.

use crate::config::{Selectors, SiteProfile};
use crate::enrichment::{EntityTagger, Summarizer, enrich};
use crate::error::CrawlError;
use crate::fetch::PageFetcher;
use crate::models::{ArticleRecord, StoredDocument};
use crate::outputs::DocumentStore;
use crate::scrapers::article::parse_article_page;
use crate::scrapers::listing::extract_listing;
use crate::utils::backoff_with_jitter;
use chrono::Local;
use futures::stream::{self, StreamExt};
use scraper::Html;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Cap on the backoff between listing page retries.
const MAX_PAGE_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Tunables for one crawl run.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub start_page: u32,
    pub end_page: u32,
    /// Article pages processed at the same time (minimum 1).
    pub concurrency: usize,
    /// Listing fetch retries before the crawl fails.
    pub page_retries: usize,
    pub retry_base_delay: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            start_page: 0,
            end_page: 2,
            concurrency: 4,
            page_retries: 1,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// Pagination state and counters for a crawl in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlState {
    start_page: u32,
    end_page: u32,
    page: u32,
    /// Set once the counter steps past `end_page`, including at `u32::MAX`.
    finished: bool,
    pub listings_fetched: usize,
    pub articles_found: usize,
    pub stored: usize,
    pub fetch_failed: usize,
    pub store_failed: usize,
}

impl CrawlState {
    pub fn new(start_page: u32, end_page: u32) -> Result<Self, CrawlError> {
        if start_page > end_page {
            return Err(CrawlError::InvalidPageRange {
                start: start_page,
                end: end_page,
            });
        }
        Ok(Self {
            start_page,
            end_page,
            page: start_page,
            finished: false,
            listings_fetched: 0,
            articles_found: 0,
            stored: 0,
            fetch_failed: 0,
            store_failed: 0,
        })
    }

    /// The listing page the crawl is on.
    pub fn current_page(&self) -> u32 {
        self.page
    }

    /// Move to the next listing page; `None` once past the end page.
    pub fn advance(&mut self) -> Option<u32> {
        if self.finished {
            return None;
        }
        match self.page.checked_add(1) {
            Some(next) if next <= self.end_page => {
                self.page = next;
                Some(next)
            }
            _ => {
                self.finished = true;
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn record(&mut self, outcome: ArticleOutcome) {
        match outcome {
            ArticleOutcome::Stored => self.stored += 1,
            ArticleOutcome::FetchFailed => self.fetch_failed += 1,
            ArticleOutcome::StoreFailed => self.store_failed += 1,
        }
    }
}

/// Fetch request for one article page, carrying its partial record.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleTask {
    record: ArticleRecord,
}

impl ArticleTask {
    /// Wrap a listing record. The record must already have its URL.
    pub fn new(record: ArticleRecord) -> Option<Self> {
        if record.url.is_empty() {
            None
        } else {
            Some(Self { record })
        }
    }

    pub fn url(&self) -> &str {
        &self.record.url
    }
}

/// A unit of work in the crawl queue.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlTask {
    Listing { page: u32 },
    Article(ArticleTask),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArticleOutcome {
    Stored,
    FetchFailed,
    StoreFailed,
}

/// The crawl loop with its collaborators.
///
/// Every collaborator is borrowed so callers keep ownership (tests inspect
/// the store afterwards).
pub struct Crawler<'a, F, S, T, D> {
    site: &'a SiteProfile,
    selectors: Selectors,
    fetcher: &'a F,
    summarizer: &'a S,
    tagger: &'a T,
    store: &'a D,
    options: CrawlOptions,
}

impl<'a, F, S, T, D> Crawler<'a, F, S, T, D>
where
    F: PageFetcher,
    S: Summarizer,
    T: EntityTagger,
    D: DocumentStore,
{
    /// Validate the site profile and compile its selectors.
    pub fn new(
        site: &'a SiteProfile,
        fetcher: &'a F,
        summarizer: &'a S,
        tagger: &'a T,
        store: &'a D,
        options: CrawlOptions,
    ) -> Result<Self, CrawlError> {
        site.validate()?;
        let selectors = Selectors::compile(&site.selectors)?;
        Ok(Self {
            site,
            selectors,
            fetcher,
            summarizer,
            tagger,
            store,
            options,
        })
    }

    /// Crawl the configured page range.
    ///
    /// # Returns
    ///
    /// The final [`CrawlState`] with its counters, or an error if the page
    /// range is invalid or a listing page stayed unavailable after retries.
    #[instrument(level = "info", skip_all, fields(start = self.options.start_page, end = self.options.end_page))]
    pub async fn run(&self) -> Result<CrawlState, CrawlError> {
        let t0 = Instant::now();
        let mut state = CrawlState::new(self.options.start_page, self.options.end_page)?;
        let mut queue = VecDeque::from([CrawlTask::Listing {
            page: state.current_page(),
        }]);

        while let Some(task) = queue.pop_front() {
            match task {
                CrawlTask::Listing { page } => {
                    debug!(page, "Processing listing task");
                    let Some((page_url, html)) = self.fetch_listing(&mut state).await? else {
                        break;
                    };

                    let records = {
                        let document = Html::parse_document(&html);
                        extract_listing(
                            &document,
                            &page_url,
                            &self.selectors,
                            &self.site.newspaper_name,
                        )
                    };
                    state.articles_found += records.len();
                    queue.extend(
                        records
                            .into_iter()
                            .filter_map(ArticleTask::new)
                            .map(CrawlTask::Article),
                    );

                    match state.advance() {
                        Some(next) => queue.push_back(CrawlTask::Listing { page: next }),
                        None => info!(
                            start = state.start_page,
                            end = state.end_page,
                            "Done scraping page range"
                        ),
                    }
                }
                CrawlTask::Article(first) => {
                    let mut batch = vec![first];
                    while let Some(CrawlTask::Article(_)) = queue.front() {
                        if let Some(CrawlTask::Article(task)) = queue.pop_front() {
                            batch.push(task);
                        }
                    }

                    let outcomes: Vec<ArticleOutcome> = stream::iter(batch)
                        .map(|task| self.process_article(task))
                        .buffer_unordered(self.options.concurrency.max(1))
                        .collect()
                        .await;
                    for outcome in outcomes {
                        state.record(outcome);
                    }
                }
            }
        }

        let elapsed = t0.elapsed();
        info!(
            pages = state.listings_fetched,
            found = state.articles_found,
            stored = state.stored,
            fetch_failed = state.fetch_failed,
            store_failed = state.store_failed,
            range_done = state.is_finished(),
            secs = elapsed.as_secs(),
            "Crawl finished"
        );
        Ok(state)
    }

    /// Fetch the current listing page, retrying with later pages on failure.
    ///
    /// Returns `None` when a retry would go past the end page.
    async fn fetch_listing(
        &self,
        state: &mut CrawlState,
    ) -> Result<Option<(Url, String)>, CrawlError> {
        let mut attempts = 0usize;
        loop {
            let page = state.current_page();
            let url = self.site.listing_url(page)?;
            attempts += 1;

            match self.fetcher.fetch(url.as_str()).await {
                Ok(html) => {
                    state.listings_fetched += 1;
                    info!(page, %url, "Fetched listing page");
                    return Ok(Some((url, html)));
                }
                Err(e) if attempts > self.options.page_retries => {
                    error!(page, attempts, error = %e, "Listing page unavailable; aborting crawl");
                    return Err(CrawlError::ListingUnavailable {
                        page,
                        attempts,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay =
                        backoff_with_jitter(self.options.retry_base_delay, attempts, MAX_PAGE_RETRY_DELAY);
                    warn!(page, attempts, ?delay, error = %e, "Listing fetch failed; moving to next page");
                    sleep(delay).await;
                    if state.advance().is_none() {
                        info!(page, end = state.end_page, "No pages left to retry; stopping");
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Fetch, parse, enrich, and store one article.
    #[instrument(level = "info", skip_all, fields(url = %task.url()))]
    async fn process_article(&self, task: ArticleTask) -> ArticleOutcome {
        let html = match self.fetcher.fetch(task.url()).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Article fetch failed; skipping");
                return ArticleOutcome::FetchFailed;
            }
        };

        let crawl_time = self.site.format_crawl_time(Local::now());
        let record = {
            let document = Html::parse_document(&html);
            parse_article_page(&document, task.record, &self.selectors, crawl_time)
        };
        let record = enrich(record, self.summarizer, self.tagger).await;

        let doc = StoredDocument::from(&record);
        match self.store.insert(&doc).await {
            Ok(()) => {
                info!(
                    newspaper = %record.newspaper_name,
                    title = ?record.title,
                    category = ?record.category,
                    credit = ?record.images_credit,
                    excerpt_bytes = record.excerpt.len(),
                    "Stored article"
                );
                debug!(?record, "Stored record");
                ArticleOutcome::Stored
            }
            Err(e) => {
                error!(error = %e, "Store insert failed; continuing with next article");
                ArticleOutcome::StoreFailed
            }
        }
    }
}
