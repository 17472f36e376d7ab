//! Search index connection.
//!
//! The crawler opens a connection to the search index at startup and fails
//! fast when it is configured but unreachable. Documents are not indexed
//! yet; the document store is the only write target.

use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// A reachable search index endpoint.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    url: String,
    cluster_name: Option<String>,
}

/// The part of an Elasticsearch-style root response we log.
#[derive(Debug, Deserialize)]
struct RootInfo {
    cluster_name: Option<String>,
}

impl SearchIndex {
    /// Connect to the index at `url` with a `GET` health check.
    ///
    /// # Errors
    ///
    /// Fails on an invalid URL, a network error, or a non-2xx response.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn connect(url: &str) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().timeout(HEALTH_CHECK_TIMEOUT).build()?;
        let body = client.get(url).send().await?.error_for_status()?.text().await?;
        let cluster_name = serde_json::from_str::<RootInfo>(&body)
            .ok()
            .and_then(|root| root.cluster_name);
        info!(cluster = ?cluster_name, "Search index reachable");
        Ok(Self {
            url: url.to_string(),
            cluster_name,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster_name.as_deref()
    }
}
