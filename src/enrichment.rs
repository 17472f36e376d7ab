//! Article enrichment: generated summary, keywords, and named entities.
//!
//! Two independent collaborators augment a completed record:
//!
//! | Collaborator | Trait | Fills |
//! |--------------|-------|-------|
//! | Summarizer | [`Summarizer`] | `generated_summary`, `generated_keywords` |
//! | Entity tagger | [`EntityTagger`] | `entities` (six categories, all mentions) |
//!
//! Both production implementations are LLM-backed ([`LlmSummarizer`],
//! [`LlmEntityTagger`]) and each sends the record's body text with its own
//! chat template. The body already parsed from the article page is used,
//! so both collaborators always see the same text.
//!
//! # Fault isolation
//!
//! [`enrich`] runs both collaborators and never fails. A failing
//! collaborator is logged and its fields keep their explicit empty values;
//! the other collaborator's output is still attached.

use crate::api::AskAsync;
use crate::models::{ArticleRecord, ArticleSummary, EntityCategory, EntityTags};
use crate::utils::{looks_truncated, truncate_for_log};
use itertools::Itertools;
use serde::de::DeserializeOwned;
use std::error::Error;
use tracing::{info, instrument, warn};

/// Produces a summary and keyword set for an article body.
pub trait Summarizer {
    async fn summarize(&self, body: &str) -> Result<ArticleSummary, Box<dyn Error>>;
}

/// Finds named entities in an article body.
pub trait EntityTagger {
    async fn tag(&self, body: &str) -> Result<EntityTags, Box<dyn Error>>;
}

/// Summarizer that asks an LLM for `{"summary": "...", "keywords": [...]}`.
#[derive(Debug)]
pub struct LlmSummarizer<A> {
    api: A,
}

impl<A> LlmSummarizer<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A> Summarizer for LlmSummarizer<A>
where
    A: AskAsync<Response = String>,
{
    #[instrument(level = "debug", skip_all)]
    async fn summarize(&self, body: &str) -> Result<ArticleSummary, Box<dyn Error>> {
        let raw: ArticleSummary = ask_json(&self.api, body).await?;
        Ok(ArticleSummary {
            summary: raw.summary.trim().to_string(),
            keywords: normalize_keywords(raw.keywords),
        })
    }
}

/// Entity tagger that asks an LLM for one list of mentions per category.
#[derive(Debug)]
pub struct LlmEntityTagger<A> {
    api: A,
}

impl<A> LlmEntityTagger<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A> EntityTagger for LlmEntityTagger<A>
where
    A: AskAsync<Response = String>,
{
    #[instrument(level = "debug", skip_all)]
    async fn tag(&self, body: &str) -> Result<EntityTags, Box<dyn Error>> {
        let raw: EntityTags = ask_json(&self.api, body).await?;
        Ok(EntityTags {
            person: clean_mentions(raw.person),
            organization: clean_mentions(raw.organization),
            money: clean_mentions(raw.money),
            time: clean_mentions(raw.time),
            location: clean_mentions(raw.location),
            percent: clean_mentions(raw.percent),
        })
    }
}

/// Attach summary, keywords, and entity tags to `record`.
///
/// Never fails: collaborator errors are logged and leave the affected
/// fields at their empty values. A record with an empty body is returned
/// untouched without calling either collaborator.
#[instrument(level = "info", skip_all, fields(url = %record.url))]
pub async fn enrich<S, T>(mut record: ArticleRecord, summarizer: &S, tagger: &T) -> ArticleRecord
where
    S: Summarizer,
    T: EntityTagger,
{
    if record.article.trim().is_empty() {
        warn!("Article body is empty; skipping enrichment");
        return record;
    }

    let (summary, tags) = tokio::join!(
        summarizer.summarize(&record.article),
        tagger.tag(&record.article)
    );

    match summary {
        Ok(summary) => {
            record.generated_summary = summary.summary;
            record.generated_keywords = summary.keywords;
        }
        Err(e) => {
            warn!(error = %e, "Summarizer failed; summary and keywords left empty");
            record.generated_summary = String::new();
            record.generated_keywords = Vec::new();
        }
    }

    match tags {
        Ok(tags) => {
            record.entities = tags;
        }
        Err(e) => {
            warn!(error = %e, "Entity tagger failed; entity fields left empty");
            record.entities = EntityTags::default();
        }
    }

    info!(
        keywords = record.generated_keywords.len(),
        tagged = !record.entities.is_empty(),
        entities = record.entities.total(),
        person = ?record.entities.first(EntityCategory::Person),
        "Enriched article"
    );
    record
}

/// Ask the LLM and parse its reply as JSON, re-asking once on truncation.
async fn ask_json<A, T>(api: &A, text: &str) -> Result<T, Box<dyn Error>>
where
    A: AskAsync<Response = String>,
    T: DeserializeOwned,
{
    let reply = api.ask(text).await?;
    match serde_json::from_str::<T>(strip_code_fence(&reply)) {
        Ok(parsed) => Ok(parsed),
        Err(e) if looks_truncated(&e) => {
            warn!(error = %e, "EOF while parsing; re-asking once");
            let retry = api.ask(text).await?;
            Ok(serde_json::from_str::<T>(strip_code_fence(&retry))?)
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&reply, 300),
                "Model returned non-conforming JSON"
            );
            Err(e.into())
        }
    }
}

/// Models often wrap JSON in a Markdown code fence.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Trimmed, non-empty, case-insensitively de-duplicated keywords.
fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .unique_by(|k| k.to_lowercase())
        .collect()
}

/// Trimmed, non-empty mentions; repeats are kept since they are occurrences.
fn clean_mentions(mentions: Vec<String>) -> Vec<String> {
    mentions
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::{FixedSummarizer, FixedTagger, summary, tags};
    use super::*;
    use crate::api::testing::ScriptedAsk;

    fn record_with_body(body: &str) -> ArticleRecord {
        ArticleRecord {
            url: "https://example.com/a".to_string(),
            article: body.to_string(),
            ..ArticleRecord::default()
        }
    }

    #[tokio::test]
    async fn test_enrich_attaches_both() {
        let record = enrich(
            record_with_body("Parliament passed the budget in Dhaka."),
            &FixedSummarizer(Ok(summary())),
            &FixedTagger(Ok(tags())),
        )
        .await;
        assert_eq!(record.generated_summary, "Parliament passed the budget.");
        assert_eq!(record.generated_keywords.len(), 2);
        assert_eq!(
            record.entities.first(EntityCategory::Person).as_deref(),
            Some("AMA Muhith")
        );
        assert_eq!(record.entities.location.len(), 2);
    }

    #[tokio::test]
    async fn test_tagger_failure_keeps_summary() {
        let record = enrich(
            record_with_body("Parliament passed the budget."),
            &FixedSummarizer(Ok(summary())),
            &FixedTagger(Err("NER CRASHED".to_string())),
        )
        .await;
        assert_eq!(record.generated_summary, "Parliament passed the budget.");
        assert_eq!(record.generated_keywords, vec!["budget", "parliament"]);
        assert_eq!(record.entities, EntityTags::default());
        assert_eq!(record.entities.first(EntityCategory::Money), None);
    }

    #[tokio::test]
    async fn test_summarizer_failure_keeps_tags() {
        let record = enrich(
            record_with_body("Parliament passed the budget."),
            &FixedSummarizer(Err("download failed".to_string())),
            &FixedTagger(Ok(tags())),
        )
        .await;
        assert_eq!(record.generated_summary, "");
        assert!(record.generated_keywords.is_empty());
        assert_eq!(record.entities, tags());
    }

    #[tokio::test]
    async fn test_empty_body_skips_collaborators() {
        let api = ScriptedAsk::always_failing();
        let summarizer = LlmSummarizer::new(api);
        let record = enrich(record_with_body("   "), &summarizer, &FixedTagger(Ok(tags()))).await;
        assert_eq!(summarizer.api.calls.get(), 0);
        assert!(record.entities.is_empty());
    }

    #[tokio::test]
    async fn test_llm_summarizer_parses_and_normalizes() {
        let reply = r#"```json
{"summary": "  Budget passed. ", "keywords": ["Budget", " budget ", "", "Dhaka"]}
```"#;
        let summarizer = LlmSummarizer::new(ScriptedAsk::new(vec![Ok(reply)]));
        let summary = summarizer.summarize("body").await.unwrap();
        assert_eq!(summary.summary, "Budget passed.");
        assert_eq!(summary.keywords, vec!["Budget", "Dhaka"]);
    }

    #[tokio::test]
    async fn test_llm_summarizer_reasks_once_on_truncation() {
        let api = ScriptedAsk::new(vec![
            Ok(r#"{"summary": "Budg"#),
            Ok(r#"{"summary": "Budget passed.", "keywords": []}"#),
        ]);
        let summarizer = LlmSummarizer::new(api);
        let summary = summarizer.summarize("body").await.unwrap();
        assert_eq!(summary.summary, "Budget passed.");
        assert_eq!(summarizer.api.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_llm_summarizer_rejects_non_json() {
        let summarizer = LlmSummarizer::new(ScriptedAsk::new(vec![Ok("I cannot do that.")]));
        assert!(summarizer.summarize("body").await.is_err());
        assert_eq!(summarizer.api.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_llm_entity_tagger_fills_missing_categories() {
        let reply = r#"{"person": ["AMA Muhith", " "], "percent": ["7.8%"]}"#;
        let tagger = LlmEntityTagger::new(ScriptedAsk::new(vec![Ok(reply)]));
        let tags = tagger.tag("body").await.unwrap();
        assert_eq!(tags.person, vec!["AMA Muhith"]);
        assert_eq!(tags.percent, vec!["7.8%"]);
        assert!(tags.organization.is_empty());
    }

    #[tokio::test]
    async fn test_llm_failure_is_isolated_in_enrich() {
        let tagger = LlmEntityTagger::new(ScriptedAsk::always_failing());
        let record = enrich(
            record_with_body("Parliament passed the budget."),
            &FixedSummarizer(Ok(summary())),
            &tagger,
        )
        .await;
        assert_eq!(record.generated_summary, "Parliament passed the budget.");
        assert!(record.entities.is_empty());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {} "), "{}");
    }
}
