//! Command-line interface definitions for the archive crawler.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Connection settings can also come from environment variables.

use clap::Parser;

/// Command-line arguments for the archive crawler.
///
/// # Examples
///
/// ```sh
/// # Crawl the default range (pages 0 to 2)
/// archive_news_crawler
///
/// # Crawl pages 10 to 20 into a custom store, checking the search index
/// archive_news_crawler --start-page 10 --end-page 20 \
///     --store-path ./data/news.jsonl --search-index-url http://localhost:9200
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// First listing page to crawl
    #[arg(short, long, default_value_t = 0)]
    pub start_page: u32,

    /// Last listing page to crawl (inclusive)
    #[arg(short, long, default_value_t = 2)]
    pub end_page: u32,

    /// Optional YAML site profile (archive URL, selectors, ...)
    #[arg(long)]
    pub site_config: Option<String>,

    /// JSON-lines file the documents are appended to
    #[arg(long, env = "NEWS_STORE_PATH", default_value = "./news_db/news_db.jsonl")]
    pub store_path: String,

    /// Search index URL; checked for reachability at startup
    #[arg(long, env = "SEARCH_INDEX_URL")]
    pub search_index_url: Option<String>,

    /// Optional path to the LLM client config.yaml (defaults to the client's config dir)
    #[arg(long)]
    pub llm_config: Option<String>,

    /// Chat template used for summaries and keywords
    #[arg(long, default_value = "article_summarizer")]
    pub summary_template: String,

    /// Chat template used for named-entity tagging
    #[arg(long, default_value = "entity_tagger")]
    pub entity_template: String,

    /// Article pages processed at the same time
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Retries (each with the next page number) when a listing page fails
    #[arg(long, default_value_t = 1)]
    pub page_retries: usize,
}
