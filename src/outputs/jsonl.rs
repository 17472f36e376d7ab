//! JSON-lines document store.
//!
//! Every document is serialized to a single line and appended to the store
//! file. The file is opened once in append mode; writes are serialized
//! through a mutex so concurrent article tasks never interleave lines.

use crate::models::StoredDocument;
use crate::outputs::DocumentStore;
use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Append-only JSON-lines file of [`StoredDocument`]s.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesStore {
    /// Open (or create) the store file, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Fails if the directory is not writable or the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_writable_dir(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        info!(path = %path.display(), "Opened document store");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonLinesStore {
    #[instrument(level = "debug", skip_all, fields(id = %doc.id))]
    async fn insert(&self, doc: &StoredDocument) -> Result<(), Box<dyn Error>> {
        let mut line = serde_json::to_vec(doc)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        debug!(bytes = line.len(), "Inserted document");
        Ok(())
    }
}
