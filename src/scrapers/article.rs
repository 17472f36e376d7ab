//! Article page extraction.
//!
//! [`parse_article_page`] completes a partial record from the listing with
//! everything that only the article page carries. It is a pure function of
//! the page, the record, and the crawl timestamp, so it can be tested
//! against saved pages.

use crate::config::Selectors;
use crate::models::ArticleRecord;
use crate::scrapers::{first_own_text, own_text_nodes};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use tracing::{debug, instrument};
use url::Url;

/// Leading "Photo- " label on image credits.
static PHOTO_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*photo\s*-\s*").expect("static regex"));

/// Separators used in the breadcrumb trail.
const BREADCRUMB_SEPARATORS: [&str; 2] = [">>", "»"];

/// Fill the article-page fields of `record`.
///
/// # Arguments
///
/// * `document` - The parsed article page
/// * `record` - Partial record from the listing page
/// * `selectors` - Compiled selectors from the site profile
/// * `crawl_time` - Already formatted extraction timestamp
///
/// # Field rules
///
/// - Caption and credit are only read when the page has a lead image.
/// - The reporter bio comes from the author block when the page has one,
///   otherwise from the first emphasized text in the body.
/// - Missing elements leave the field `None`; the body is `""` at worst.
#[instrument(level = "info", skip_all, fields(url = %record.url))]
pub fn parse_article_page(
    document: &Html,
    mut record: ArticleRecord,
    selectors: &Selectors,
    crawl_time: String,
) -> ArticleRecord {
    record.shoulder = first_own_text(document.select(&selectors.shoulder));

    record.images = document
        .select(&selectors.image)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(|src| resolve_against(&record.url, src));

    if record.images.is_some() {
        let captions = document
            .select(&selectors.image_caption)
            .flat_map(own_text_nodes)
            .collect::<Vec<_>>();
        record.image_captions = Some(captions.join(" "));
        record.images_credit = first_own_text(document.select(&selectors.image_credit))
            .map(|credit| strip_photo_label(&credit));
    }

    record.article = document
        .select(&selectors.body_paragraph)
        .flat_map(own_text_nodes)
        .collect::<Vec<_>>()
        .join(" ");

    record.about_reporter = if document.select(&selectors.author_info).next().is_some() {
        first_own_text(document.select(&selectors.author_description))
    } else {
        first_own_text(document.select(&selectors.body_emphasis))
    };

    record.category = first_own_text(document.select(&selectors.category));
    record.breadcrumb =
        first_own_text(document.select(&selectors.breadcrumb)).map(|trail| split_breadcrumb(&trail));

    record.crawl_time = crawl_time;

    debug!(
        body_bytes = record.article.len(),
        has_image = record.images.is_some(),
        has_bio = record.about_reporter.is_some(),
        "Parsed article page"
    );
    record
}

/// Split a breadcrumb trail into trimmed, non-empty segments.
///
/// ```ignore
/// assert_eq!(split_breadcrumb("A >> B >>  "), vec!["A", "B"]);
/// ```
pub fn split_breadcrumb(trail: &str) -> Vec<String> {
    let mut normalized = trail.to_string();
    for sep in &BREADCRUMB_SEPARATORS[1..] {
        normalized = normalized.replace(sep, BREADCRUMB_SEPARATORS[0]);
    }
    normalized
        .split(BREADCRUMB_SEPARATORS[0])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove a leading "Photo- " label; anything else is returned unchanged.
pub fn strip_photo_label(credit: &str) -> String {
    PHOTO_LABEL.replace(credit, "").into_owned()
}

fn resolve_against(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;

    const ARTICLE: &str = include_str!("../../fixtures/article_page.html");
    const ARTICLE_MINIMAL: &str = include_str!("../../fixtures/article_page_minimal.html");
    const CRAWL_TIME: &str = "2018-06-07 10:00:00";

    fn parse(html: &str, url: &str) -> ArticleRecord {
        let selectors = Selectors::compile(&SelectorConfig::default()).unwrap();
        let record = ArticleRecord::from_listing(
            url.to_string(),
            Some("Title".to_string()),
            Some("June 7th, 2018".to_string()),
            "Excerpt".to_string(),
            Some("Jane Doe".to_string()),
            "Dhaka Tribune",
        );
        parse_article_page(
            &Html::parse_document(html),
            record,
            &selectors,
            CRAWL_TIME.to_string(),
        )
    }

    #[test]
    fn test_breadcrumb_split() {
        assert_eq!(split_breadcrumb("A >> B >>  "), vec!["A", "B"]);
        assert_eq!(split_breadcrumb("News » World » Asia"), vec!["News", "World", "Asia"]);
        assert!(split_breadcrumb(" >> ").is_empty());
    }

    #[test]
    fn test_strip_photo_label() {
        assert_eq!(strip_photo_label("Photo- Jane Doe"), "Jane Doe");
        assert_eq!(strip_photo_label("Jane Doe"), "Jane Doe");
        assert_eq!(strip_photo_label("Courtesy of Photo- Studio"), "Courtesy of Photo- Studio");
    }

    #[test]
    fn test_full_article_page() {
        let record = parse(
            ARTICLE,
            "http://archive.dhakatribune.com/bangladesh/2018/06/07/budget-passed",
        );
        assert_eq!(record.shoulder.as_deref(), Some("Budget FY2018-19"));
        assert_eq!(
            record.images.as_deref(),
            Some("http://archive.dhakatribune.com/sites/default/files/budget.jpg")
        );
        assert_eq!(
            record.image_captions.as_deref(),
            Some("Finance Minister AMA Muhith in parliament on Thursday")
        );
        assert_eq!(record.images_credit.as_deref(), Some("Mahmud Hossain Opu"));
        assert_eq!(
            record.article,
            "Parliament passed the Tk 4.64 lakh crore budget on Thursday. \
             Finance Minister AMA Muhith placed the bill in Dhaka."
        );
        assert_eq!(
            record.about_reporter.as_deref(),
            Some("Jane Doe covers the economy for Dhaka Tribune.")
        );
        assert_eq!(record.category.as_deref(), Some("Bangladesh"));
        assert_eq!(
            record.breadcrumb,
            Some(vec!["News".to_string(), "Bangladesh".to_string()])
        );
        assert_eq!(record.crawl_time, CRAWL_TIME);
    }

    #[test]
    fn test_listing_fields_survive() {
        let record = parse(ARTICLE, "http://archive.dhakatribune.com/a");
        assert_eq!(record.title.as_deref(), Some("Title"));
        assert_eq!(record.excerpt, "Excerpt");
        assert_eq!(record.reporter.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_minimal_page_falls_back() {
        let record = parse(
            ARTICLE_MINIMAL,
            "http://archive.dhakatribune.com/world/2018/06/07/summit-set",
        );
        assert_eq!(record.shoulder, None);
        assert_eq!(record.images, None);
        assert_eq!(record.image_captions, None);
        assert_eq!(record.images_credit, None);
        assert_eq!(record.article, "Leaders agreed on a date for the summit.");
        assert_eq!(
            record.about_reporter.as_deref(),
            Some("John Roe is a correspondent based in Singapore.")
        );
        assert_eq!(record.category, None);
        assert_eq!(record.breadcrumb, None);
    }

    #[test]
    fn test_empty_page_yields_empty_body() {
        let record = parse("<html><body></body></html>", "http://archive.dhakatribune.com/x");
        assert_eq!(record.article, "");
        assert_eq!(record.crawl_time, CRAWL_TIME);
    }
}
