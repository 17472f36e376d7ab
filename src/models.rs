//! Data models for crawled articles and their stored representation.
//!
//! This module defines the core data structures used throughout the crawler:
//! - [`ArticleRecord`]: one article, filled in stage by stage
//! - [`ArticleSummary`]: summarizer output (summary text + keywords)
//! - [`EntityTags`]: named entities grouped by [`EntityCategory`]
//! - [`StoredDocument`]: the flat document written to the document store
//!
//! A record starts with the listing fields, gets its page fields from the
//! article parser, then its enrichment fields. Enrichment fields always hold
//! an explicit empty value until the collaborators fill them, so a stored
//! document never lacks a field.

use serde::{Deserialize, Serialize};

/// A single article as it moves through the crawl pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleRecord {
    /// Absolute article URL; the storage key.
    pub url: String,
    pub title: Option<String>,
    /// Publication date as printed on the listing page.
    pub published_date: Option<String>,
    pub excerpt: String,
    pub reporter: Option<String>,
    pub newspaper_name: String,

    /// Kicker shown above the headline.
    pub shoulder: Option<String>,
    /// Lead image URL.
    pub images: Option<String>,
    pub image_captions: Option<String>,
    pub images_credit: Option<String>,
    /// Full body text.
    pub article: String,
    pub about_reporter: Option<String>,
    pub category: Option<String>,
    pub breadcrumb: Option<Vec<String>>,
    /// When the article page was parsed, in the site profile's format.
    pub crawl_time: String,

    /// Reserved; never filled.
    pub sentiment: Option<String>,
    /// Reserved; the stored document always writes `null`.
    #[allow(dead_code)]
    pub ml_tags: Option<Vec<String>>,
    pub generated_summary: String,
    pub generated_keywords: Vec<String>,
    pub entities: EntityTags,
}

impl ArticleRecord {
    /// Create a record for a listing entry; page and enrichment fields start empty.
    pub fn from_listing(
        url: String,
        title: Option<String>,
        published_date: Option<String>,
        excerpt: String,
        reporter: Option<String>,
        newspaper_name: &str,
    ) -> Self {
        Self {
            url,
            title,
            published_date,
            excerpt,
            reporter,
            newspaper_name: newspaper_name.to_string(),
            ..Self::default()
        }
    }
}

/// Output of the summarizer collaborator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ArticleSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Named-entity categories reported by the entity tagger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    Person,
    Organization,
    Money,
    Time,
    Location,
    Percent,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 6] = [
        EntityCategory::Person,
        EntityCategory::Organization,
        EntityCategory::Money,
        EntityCategory::Time,
        EntityCategory::Location,
        EntityCategory::Percent,
    ];
}

/// All entity mentions found in an article body, in order of appearance.
///
/// The field names match the JSON object the entity tagger is asked to
/// return; a missing key deserializes as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EntityTags {
    pub person: Vec<String>,
    pub organization: Vec<String>,
    pub money: Vec<String>,
    pub time: Vec<String>,
    pub location: Vec<String>,
    pub percent: Vec<String>,
}

impl EntityTags {
    pub fn list(&self, category: EntityCategory) -> &[String] {
        match category {
            EntityCategory::Person => &self.person,
            EntityCategory::Organization => &self.organization,
            EntityCategory::Money => &self.money,
            EntityCategory::Time => &self.time,
            EntityCategory::Location => &self.location,
            EntityCategory::Percent => &self.percent,
        }
    }

    /// The representative (first) mention of a category.
    pub fn first(&self, category: EntityCategory) -> Option<String> {
        self.list(category).first().cloned()
    }

    pub fn is_empty(&self) -> bool {
        EntityCategory::ALL.iter().all(|c| self.list(*c).is_empty())
    }

    pub fn total(&self) -> usize {
        EntityCategory::ALL.iter().map(|c| self.list(*c).len()).sum()
    }
}

/// The document written to the store, one per article.
///
/// Field names are part of the storage contract and must not change.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoredDocument {
    pub id: String,
    pub news_url: String,
    pub reporter: Option<String>,
    pub about_reporter: Option<String>,
    pub published: Option<String>,
    pub title: Option<String>,
    pub content: String,
    pub images: Option<String>,
    pub image_captions: Option<String>,
    pub breadcrumb: Option<Vec<String>>,
    pub sentiment: Option<String>,
    pub ml_tags: Option<Vec<String>>,
    pub shoulder: Option<String>,

    pub ner_person: Option<String>,
    pub ner_organization: Option<String>,
    pub ner_money: Option<String>,
    pub ner_time: Option<String>,
    pub ner_location: Option<String>,
    pub ner_percent: Option<String>,

    pub ner_list_person: Vec<String>,
    pub ner_list_organization: Vec<String>,
    pub ner_list_money: Vec<String>,
    pub ner_list_time: Vec<String>,
    pub ner_list_location: Vec<String>,
    pub ner_list_percent: Vec<String>,

    pub generated_keywords: Vec<String>,
    pub generated_summary: String,
    pub crawled_time: String,
    pub timestamp: String,
}

impl From<&ArticleRecord> for StoredDocument {
    fn from(record: &ArticleRecord) -> Self {
        let tags = &record.entities;
        Self {
            id: record.url.clone(),
            news_url: record.url.clone(),
            reporter: record.reporter.clone(),
            about_reporter: record.about_reporter.clone(),
            published: record.published_date.clone(),
            title: record.title.clone(),
            content: record.article.clone(),
            images: record.images.clone(),
            image_captions: record.image_captions.clone(),
            breadcrumb: record.breadcrumb.clone(),
            sentiment: record.sentiment.clone(),
            ml_tags: None,
            shoulder: record.shoulder.clone(),

            ner_person: tags.first(EntityCategory::Person),
            ner_organization: tags.first(EntityCategory::Organization),
            ner_money: tags.first(EntityCategory::Money),
            ner_time: tags.first(EntityCategory::Time),
            ner_location: tags.first(EntityCategory::Location),
            ner_percent: tags.first(EntityCategory::Percent),

            ner_list_person: tags.person.clone(),
            ner_list_organization: tags.organization.clone(),
            ner_list_money: tags.money.clone(),
            ner_list_time: tags.time.clone(),
            ner_list_location: tags.location.clone(),
            ner_list_percent: tags.percent.clone(),

            generated_keywords: record.generated_keywords.clone(),
            generated_summary: record.generated_summary.clone(),
            crawled_time: record.crawl_time.clone(),
            timestamp: record.crawl_time.clone(),
        }
    }
}
