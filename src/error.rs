//! Crawl-level error types.
//!
//! Collaborator calls (HTTP fetches, LLM requests, store writes) return
//! `Box<dyn Error>` and are mostly handled where they happen. The variants
//! here are the failures that stop the crawl or prevent it from starting.

use thiserror::Error;

/// Errors that abort a crawl or prevent it from starting.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The requested page range is empty.
    #[error("invalid page range: start page {start} is after end page {end}")]
    InvalidPageRange { start: u32, end: u32 },

    /// A listing page could not be fetched even after the retry policy ran out.
    #[error("listing page {page} unavailable after {attempts} attempt(s): {reason}")]
    ListingUnavailable {
        page: u32,
        attempts: usize,
        reason: String,
    },

    /// A configured CSS selector does not parse.
    #[error("invalid selector for {field}: {reason}")]
    Selector { field: &'static str, reason: String },

    /// The crawl timestamp format is not a valid `chrono` format string.
    #[error("invalid crawl time format {0:?}")]
    TimeFormat(String),

    /// The configured archive URL is not a valid absolute URL.
    #[error("invalid archive url {url}: {reason}")]
    Url { url: String, reason: String },
}

impl CrawlError {
    pub fn selector(field: &'static str, err: impl std::fmt::Display) -> Self {
        CrawlError::Selector {
            field,
            reason: err.to_string(),
        }
    }
}
