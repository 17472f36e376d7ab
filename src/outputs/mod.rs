//! Persistence for crawled articles.
//!
//! # Submodules
//!
//! - [`jsonl`]: Appends each [`StoredDocument`] as one JSON line to a file
//! - [`search`]: Search index connection, checked at startup
//!
//! Stores implement [`DocumentStore`]. A store performs a plain insert:
//! crawling the same article twice writes two documents.
//!
//! # Output Structure
//!
//! ```text
//! news_db/
//! └── news_db.jsonl   # one document per line, in crawl order
//! ```

pub mod jsonl;
#[cfg(test)]
pub mod memory;
pub mod search;

use crate::models::StoredDocument;
use std::error::Error;

/// A document store that accepts one article document at a time.
pub trait DocumentStore {
    /// Insert `doc`; success means it was written.
    async fn insert(&self, doc: &StoredDocument) -> Result<(), Box<dyn Error>>;
}
