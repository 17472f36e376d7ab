//! Site profile configuration.
//!
//! Everything that ties the crawler to one particular news site lives here:
//! the archive URL, the newspaper name stamped on every record, the format
//! of the crawl timestamp, and the CSS selectors used by the listing and
//! article extractors. Retargeting the crawler at another site means
//! swapping this profile, nothing else.
//!
//! The built-in defaults describe the Dhaka Tribune archive. A YAML file
//! can override any subset of fields:
//!
//! ```yaml
//! archive_url: "https://example.com/archive"
//! newspaper_name: "Example Times"
//! selectors:
//!   listing_entry: "article.teaser"
//!   breadcrumb: "nav.crumbs > span"
//! ```

use crate::error::CrawlError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Write};
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Site-specific crawl settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Archive listing endpoint; the page number is sent as `?page={n}`.
    pub archive_url: String,
    /// Constant stored on every record as `newspaper_name`.
    pub newspaper_name: String,
    /// `chrono` format string for the crawl timestamp.
    pub crawl_time_format: String,
    /// CSS selectors for listing and article pages.
    pub selectors: SelectorConfig,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            archive_url: "http://archive.dhakatribune.com/archive".to_string(),
            newspaper_name: "Dhaka Tribune".to_string(),
            crawl_time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl SiteProfile {
    /// Check everything that would otherwise fail mid-crawl.
    pub fn validate(&self) -> Result<(), CrawlError> {
        self.listing_url(0)?;
        if StrftimeItems::new(&self.crawl_time_format).any(|item| matches!(item, Item::Error)) {
            return Err(CrawlError::TimeFormat(self.crawl_time_format.clone()));
        }
        Ok(())
    }

    /// Format `now` with the profile's crawl time format.
    pub fn format_crawl_time<Tz>(&self, now: DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut out = String::new();
        // An invalid format is rejected by `validate`; fall back to RFC 3339 anyway.
        if write!(out, "{}", now.format(&self.crawl_time_format)).is_err() {
            out = now.to_rfc3339();
        }
        out
    }

    /// Build the URL of listing page `page`.
    ///
    /// Any `page` parameter already present on the archive URL is replaced,
    /// other query parameters are kept.
    pub fn listing_url(&self, page: u32) -> Result<Url, CrawlError> {
        let mut url = Url::parse(&self.archive_url).map_err(|e| CrawlError::Url {
            url: self.archive_url.clone(),
            reason: e.to_string(),
        })?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "page")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}

/// Raw selector strings, as written in the YAML profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One repeated teaser block on a listing page.
    pub listing_entry: String,
    /// Headline link inside a teaser (href and title).
    pub entry_link: String,
    /// Byline block inside a teaser; its own text is the published date.
    pub entry_meta: String,
    /// Reporter link inside the byline block.
    pub entry_reporter: String,
    /// Excerpt paragraph inside a teaser.
    pub entry_excerpt: String,
    pub shoulder: String,
    pub image: String,
    pub image_caption: String,
    pub image_credit: String,
    /// Paragraphs of the article body.
    pub body_paragraph: String,
    /// Dedicated author block; when present it wins over `body_emphasis`.
    pub author_info: String,
    pub author_description: String,
    /// Emphasized text in the body, used as reporter bio fallback.
    pub body_emphasis: String,
    pub category: String,
    pub breadcrumb: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_entry: "div.post-inner".to_string(),
            entry_link: "header > h2 > a".to_string(),
            entry_meta: "header > div:first-of-type".to_string(),
            entry_reporter: "header > div:first-of-type > span > a".to_string(),
            entry_excerpt: "header ~ div > p".to_string(),
            shoulder: "div.shoulder".to_string(),
            image: "ul.singleslider > li > img".to_string(),
            image_caption: "ul.singleslider > li".to_string(),
            image_credit: "ul.singleslider > li > span".to_string(),
            body_paragraph: "div[class*='article-content'] p".to_string(),
            author_info: "div.author-info".to_string(),
            author_description: "div.author-info p.description".to_string(),
            body_emphasis: "div[class*='article-content'] em".to_string(),
            category: "span.art-tagss > a".to_string(),
            breadcrumb: "div.node > span > span".to_string(),
        }
    }
}

/// Selectors parsed once at startup and shared by both extractors.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub listing_entry: Selector,
    pub entry_link: Selector,
    pub entry_meta: Selector,
    pub entry_reporter: Selector,
    pub entry_excerpt: Selector,
    pub shoulder: Selector,
    pub image: Selector,
    pub image_caption: Selector,
    pub image_credit: Selector,
    pub body_paragraph: Selector,
    pub author_info: Selector,
    pub author_description: Selector,
    pub body_emphasis: Selector,
    pub category: Selector,
    pub breadcrumb: Selector,
}

fn compile(field: &'static str, css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css).map_err(|e| CrawlError::selector(field, e))
}

impl Selectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, CrawlError> {
        Ok(Self {
            listing_entry: compile("listing_entry", &config.listing_entry)?,
            entry_link: compile("entry_link", &config.entry_link)?,
            entry_meta: compile("entry_meta", &config.entry_meta)?,
            entry_reporter: compile("entry_reporter", &config.entry_reporter)?,
            entry_excerpt: compile("entry_excerpt", &config.entry_excerpt)?,
            shoulder: compile("shoulder", &config.shoulder)?,
            image: compile("image", &config.image)?,
            image_caption: compile("image_caption", &config.image_caption)?,
            image_credit: compile("image_credit", &config.image_credit)?,
            body_paragraph: compile("body_paragraph", &config.body_paragraph)?,
            author_info: compile("author_info", &config.author_info)?,
            author_description: compile("author_description", &config.author_description)?,
            body_emphasis: compile("body_emphasis", &config.body_emphasis)?,
            category: compile("category", &config.category)?,
            breadcrumb: compile("breadcrumb", &config.breadcrumb)?,
        })
    }
}

/// Load a site profile from YAML, or fall back to the built-in defaults.
#[instrument(level = "info")]
pub async fn load_site_profile(path: Option<&str>) -> Result<SiteProfile, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No site config given; using built-in profile");
        return Ok(SiteProfile::default());
    };
    let raw = fs::read_to_string(path).await?;
    let profile: SiteProfile = serde_yaml::from_str(&raw)?;
    info!(%path, newspaper = %profile.newspaper_name, "Loaded site profile");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selectors_compile() {
        assert!(Selectors::compile(&SelectorConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_selector_names_field() {
        let config = SelectorConfig {
            category: "span[[".to_string(),
            ..SelectorConfig::default()
        };
        match Selectors::compile(&config) {
            Err(CrawlError::Selector { field, .. }) => assert_eq!(field, "category"),
            other => panic!("expected selector error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_listing_url_appends_page() {
        let profile = SiteProfile::default();
        assert_eq!(
            profile.listing_url(3).unwrap().as_str(),
            "http://archive.dhakatribune.com/archive?page=3"
        );
    }

    #[test]
    fn test_listing_url_replaces_existing_page() {
        let profile = SiteProfile {
            archive_url: "https://example.com/archive?section=world&page=9".to_string(),
            ..SiteProfile::default()
        };
        assert_eq!(
            profile.listing_url(0).unwrap().as_str(),
            "https://example.com/archive?section=world&page=0"
        );
    }

    #[test]
    fn test_listing_url_rejects_relative_base() {
        let profile = SiteProfile {
            archive_url: "/archive".to_string(),
            ..SiteProfile::default()
        };
        assert!(matches!(profile.listing_url(0), Err(CrawlError::Url { .. })));
    }

    #[test]
    fn test_yaml_overrides_subset() {
        let yaml = r#"
newspaper_name: "Example Times"
selectors:
  listing_entry: "article.teaser"
"#;
        let profile: SiteProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(profile.newspaper_name, "Example Times");
        assert_eq!(profile.selectors.listing_entry, "article.teaser");
        assert_eq!(profile.archive_url, SiteProfile::default().archive_url);
        assert_eq!(profile.selectors.breadcrumb, "div.node > span > span");
    }

    #[test]
    fn test_example_profile_matches_defaults() {
        let yaml = include_str!("../templates/site_profile.example.yaml");
        let profile: SiteProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(profile, SiteProfile::default());
    }

    #[test]
    fn test_validate_rejects_bad_time_format() {
        let profile = SiteProfile {
            crawl_time_format: "%Y-%Q".to_string(),
            ..SiteProfile::default()
        };
        assert!(matches!(profile.validate(), Err(CrawlError::TimeFormat(_))));
        assert!(SiteProfile::default().validate().is_ok());
    }

    #[test]
    fn test_format_crawl_time() {
        use chrono::NaiveDate;
        let now = NaiveDate::from_ymd_opt(2018, 6, 7)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(SiteProfile::default().format_crawl_time(now), "2018-06-07 10:00:00");
    }

    #[tokio::test]
    async fn test_load_site_profile_without_path_uses_default() {
        let profile = load_site_profile(None).await.unwrap();
        assert_eq!(profile, SiteProfile::default());
    }
}
