//! # Archive News Crawler
//!
//! Crawls a news site's archive listing pages, extracts every article,
//! enriches it with an LLM-generated summary, keywords, and named-entity
//! tags, and appends the result to a document store.
//!
//! ## Usage
//!
//! ```sh
//! archive_news_crawler --start-page 0 --end-page 2
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Pagination**: Walk listing pages `start_page..=end_page`
//! 2. **Listing extraction**: Turn each teaser into a partial record
//! 3. **Article parsing**: Fetch each article page and complete the record
//! 4. **Enrichment**: Summary, keywords, and entities from the LLM
//! 5. **Persistence**: Map the record to a document and insert it

use awful_aj::{config_dir, template};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod crawler;
mod enrichment;
mod error;
mod fetch;
mod models;
mod outputs;
mod scrapers;
mod utils;

use api::retrying_client;
use cli::Cli;
use crawler::{CrawlOptions, CrawlState, Crawler};
use enrichment::{LlmEntityTagger, LlmSummarizer};
use fetch::HttpFetcher;
use outputs::jsonl::JsonLinesStore;
use outputs::search::SearchIndex;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("archive_news_crawler starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Reject an empty range before touching the network.
    CrawlState::new(args.start_page, args.end_page)?;

    // ---- Site profile ----
    let site = config::load_site_profile(args.site_config.as_deref()).await?;
    site.validate()?;

    // ---- Search index ----
    if let Some(url) = args.search_index_url.as_deref() {
        match SearchIndex::connect(url).await {
            Ok(index) => info!(url = index.url(), cluster = ?index.cluster_name(), "Search index connected"),
            Err(e) => {
                error!(%url, error = %e, "Search index unreachable");
                return Err(e);
            }
        }
    }

    // ---- Document store ----
    let store = match JsonLinesStore::open(&args.store_path).await {
        Ok(store) => store,
        Err(e) => {
            error!(
                path = %args.store_path,
                error = %e,
                "Document store is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    };

    // ---- Load LLM config & templates ----
    let llm_config_path = match args.llm_config.clone() {
        Some(path) => path,
        None => config_dir()?
            .join("config.yaml")
            .to_str()
            .ok_or("LLM config path is not valid UTF-8")?
            .to_string(),
    };
    let llm_config = awful_aj::config::load_config(&llm_config_path)
        .map_err(|e| format!("failed to load LLM config {llm_config_path}: {e}"))?;
    info!(config_path = %llm_config_path, "Loaded LLM configuration");

    let summary_template = template::load_template(&args.summary_template).await?;
    let entity_template = template::load_template(&args.entity_template).await?;
    info!(
        summary_template = %args.summary_template,
        entity_template = %args.entity_template,
        "Loaded templates"
    );

    let summarizer = LlmSummarizer::new(retrying_client(&llm_config, &summary_template));
    let tagger = LlmEntityTagger::new(retrying_client(&llm_config, &entity_template));
    let fetcher = HttpFetcher::new()?;

    // ---- Crawl ----
    let options = CrawlOptions {
        start_page: args.start_page,
        end_page: args.end_page,
        concurrency: usize::from(args.concurrency),
        page_retries: args.page_retries,
        ..CrawlOptions::default()
    };
    let crawler = Crawler::new(&site, &fetcher, &summarizer, &tagger, &store, options)?;

    let state = match crawler.run().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Crawl failed");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        pages = state.listings_fetched,
        stored = state.stored,
        failed = state.fetch_failed + state.store_failed,
        store = %store.path().display(),
        "Execution complete"
    );

    Ok(())
}
