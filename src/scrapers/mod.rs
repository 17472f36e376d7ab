//! HTML extraction for the archive site.
//!
//! Scraping happens in two phases, each a pure function over a parsed page:
//!
//! 1. **Listing** ([`listing`]): one archive page yields a partial
//!    [`ArticleRecord`](crate::models::ArticleRecord) per teaser block.
//! 2. **Article** ([`article`]): the article page completes that record with
//!    body text, images, reporter bio, category, and breadcrumb.
//!
//! Neither phase touches the network; the crawler fetches pages and hands
//! the parsed [`scraper::Html`] in. Selectors come from the site profile.
//!
//! # Text helpers
//!
//! The site puts most values in an element's own text nodes rather than in
//! its children, so extraction is built on [`own_text`]: the first non-blank
//! direct text node of an element, trimmed.

pub mod article;
pub mod listing;

use scraper::ElementRef;

/// First non-blank direct text node of `element`, trimmed.
pub fn own_text(element: ElementRef<'_>) -> Option<String> {
    own_text_nodes(element).into_iter().next()
}

/// All non-blank direct text nodes of `element`, each trimmed.
pub fn own_text_nodes(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// First non-blank own text across a selection of elements.
pub fn first_own_text<'a>(mut elements: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    elements.find_map(own_text)
}

/// All descendant text of `element` with whitespace collapsed; `None` if blank.
pub fn collapsed_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
