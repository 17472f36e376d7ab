//! In-memory document store for tests.

use crate::models::StoredDocument;
use crate::outputs::DocumentStore;
use std::cell::RefCell;
use std::error::Error;

/// Keeps inserted documents in a vector; can be told to reject some URLs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub documents: RefCell<Vec<StoredDocument>>,
    pub reject_urls: Vec<String>,
}

impl MemoryStore {
    pub fn rejecting(urls: &[&str]) -> Self {
        Self {
            documents: RefCell::new(Vec::new()),
            reject_urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.documents
            .borrow()
            .iter()
            .map(|d| d.news_url.clone())
            .collect()
    }
}

impl DocumentStore for MemoryStore {
    async fn insert(&self, doc: &StoredDocument) -> Result<(), Box<dyn Error>> {
        if self.reject_urls.contains(&doc.news_url) {
            return Err(format!("write rejected for {}", doc.news_url).into());
        }
        self.documents.borrow_mut().push(doc.clone());
        Ok(())
    }
}
