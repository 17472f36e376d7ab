//! Archive listing page extraction.
//!
//! A listing page holds a run of teaser blocks (`div.post-inner` on the
//! default profile). Each teaser becomes a partial [`ArticleRecord`] with
//! url, title, published date, excerpt, and reporter filled in.
//!
//! A teaser without a usable link or without an excerpt is skipped with a
//! warning; the rest of the page is still extracted.

use crate::config::Selectors;
use crate::models::ArticleRecord;
use crate::scrapers::{collapsed_text, first_own_text, own_text};
use scraper::{ElementRef, Html};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Extract one partial record per well-formed teaser on a listing page.
///
/// # Arguments
///
/// * `document` - The parsed listing page
/// * `page_url` - URL the page was fetched from; relative links resolve against it
/// * `selectors` - Compiled selectors from the site profile
/// * `newspaper_name` - Constant stamped on every record
///
/// # Returns
///
/// Records in page order. Each has a non-empty absolute `url`.
#[instrument(level = "info", skip_all, fields(page_url = %page_url))]
pub fn extract_listing(
    document: &Html,
    page_url: &Url,
    selectors: &Selectors,
    newspaper_name: &str,
) -> Vec<ArticleRecord> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (index, entry) in document.select(&selectors.listing_entry).enumerate() {
        match extract_entry(entry, page_url, selectors, newspaper_name) {
            Ok(record) => {
                debug!(index, url = %record.url, "Extracted listing entry");
                records.push(record);
            }
            Err(reason) => {
                skipped += 1;
                warn!(index, reason, "Skipping listing entry");
            }
        }
    }

    info!(count = records.len(), skipped, "Extracted listing page");
    records
}

fn extract_entry(
    entry: ElementRef<'_>,
    page_url: &Url,
    selectors: &Selectors,
    newspaper_name: &str,
) -> Result<ArticleRecord, &'static str> {
    let link = entry.select(&selectors.entry_link).next();

    let href = link
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or("missing url")?;
    let url = page_url.join(href).map_err(|_| "unresolvable url")?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err("unsupported url scheme");
    }

    let excerpt = first_own_text(entry.select(&selectors.entry_excerpt)).ok_or("missing excerpt")?;

    let title = link.and_then(collapsed_text);
    let published_date = entry.select(&selectors.entry_meta).next().and_then(own_text);
    let reporter = entry
        .select(&selectors.entry_reporter)
        .next()
        .and_then(collapsed_text);

    Ok(ArticleRecord::from_listing(
        url.to_string(),
        title,
        published_date,
        excerpt,
        reporter,
        newspaper_name,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;

    const LISTING: &str = include_str!("../../fixtures/listing_page.html");

    fn selectors() -> Selectors {
        Selectors::compile(&SelectorConfig::default()).unwrap()
    }

    fn page_url() -> Url {
        Url::parse("http://archive.dhakatribune.com/archive?page=0").unwrap()
    }

    fn extract(html: &str) -> Vec<ArticleRecord> {
        let document = Html::parse_document(html);
        extract_listing(&document, &page_url(), &selectors(), "Dhaka Tribune")
    }

    #[test]
    fn test_extracts_well_formed_entries_only() {
        let records = extract(LISTING);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| !r.url.is_empty()));
    }

    #[test]
    fn test_entry_fields() {
        let records = extract(LISTING);
        let first = &records[0];
        assert_eq!(
            first.url,
            "http://archive.dhakatribune.com/bangladesh/2018/06/07/budget-passed"
        );
        assert_eq!(first.title.as_deref(), Some("Budget for FY2018-19 passed"));
        assert_eq!(first.published_date.as_deref(), Some("June 7th, 2018"));
        assert_eq!(
            first.excerpt,
            "Parliament passed the Tk 4.64 lakh crore budget on Thursday."
        );
        assert_eq!(first.reporter.as_deref(), Some("Jane Doe"));
        assert_eq!(first.newspaper_name, "Dhaka Tribune");
    }

    #[test]
    fn test_relative_link_is_resolved() {
        let records = extract(LISTING);
        assert_eq!(
            records[1].url,
            "http://archive.dhakatribune.com/world/2018/06/07/summit-set"
        );
    }

    #[test]
    fn test_entry_without_reporter_keeps_other_fields() {
        let records = extract(LISTING);
        let last = &records[2];
        assert_eq!(last.title.as_deref(), Some("GDP growth hits 7.8%"));
        assert_eq!(last.reporter, None);
        assert_eq!(last.published_date.as_deref(), Some("June 6th, 2018"));
    }

    #[test]
    fn test_skipped_entries_do_not_stop_page() {
        let html = r#"
            <div class="post-inner"><header><h2><a>no link</a></h2></header><div><p>x</p></div></div>
            <div class="post-inner"><header><h2><a href="javascript:void(0)">js</a></h2></header><div><p>x</p></div></div>
            <div class="post-inner"><header><h2><a href="/ok">ok</a></h2></header><div><p>kept</p></div></div>
        "#;
        let records = extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "http://archive.dhakatribune.com/ok");
        assert_eq!(records[0].excerpt, "kept");
    }

    #[test]
    fn test_excerpt_comes_from_div_after_header() {
        let html = r#"
            <div class="post-inner">
                <p>stray</p>
                <header><h2><a href="/a">A</a></h2><div><p>tagline</p></div></header>
                <div><p>real excerpt</p></div>
            </div>
            <div class="post-inner">
                <header><h2><a href="/b">B</a></h2><div><p>tagline</p></div></header>
                <p>no excerpt block</p>
            </div>
        "#;
        let records = extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "http://archive.dhakatribune.com/a");
        assert_eq!(records[0].excerpt, "real excerpt");
    }

    #[test]
    fn test_page_without_entries() {
        assert!(extract("<html><body><p>No results</p></body></html>").is_empty());
    }
}
