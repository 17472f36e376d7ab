//! Utility functions for logging, retry timing, and file system checks.
//!
//! This module provides helper functions used throughout the crawler:
//! - String truncation for log previews
//! - JSON error detection for handling LLM response truncation
//! - Exponential backoff with jitter, shared by every retry loop
//! - File system validation for the document store location

use rand::{Rng, rng};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

/// Upper bound of the random jitter added to every backoff delay.
const MAX_JITTER_MS: u64 = 250;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off (e.g., due to token limits), the
/// resulting JSON will fail to parse with an EOF error. Callers use this
/// to decide whether a single re-ask is worthwhile.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Delay before retry number `attempt` (1-based), without jitter.
///
/// ```text
/// delay = min(base * 2^(attempt-1), max)
/// ```
pub fn backoff_delay(base: Duration, attempt: usize, max: Duration) -> Duration {
    let shift = attempt.saturating_sub(1).min(31) as u32;
    base.saturating_mul(1u32 << shift).min(max)
}

/// [`backoff_delay`] plus 0-250ms of random jitter.
pub fn backoff_with_jitter(base: Duration, attempt: usize, max: Duration) -> Duration {
    let jitter_ms: u64 = rng().random_range(0..=MAX_JITTER_MS);
    backoff_delay(base, attempt, max) + Duration::from_millis(jitter_ms)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Store directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
