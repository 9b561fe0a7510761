//! MediaWiki query response parsing.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

/// Top-level envelope of a MediaWiki `action=query` response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub query: QueryData,
}

/// The `query` object: redirect and normalization maps plus per-page data.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryData {
    #[serde(default)]
    pub redirects: Vec<TitleMapping>,
    #[serde(default)]
    pub normalized: Vec<TitleMapping>,
    #[serde(default)]
    pub pages: HashMap<String, Page>,
}

/// One `from -> to` entry from `redirects` or `normalized`.
#[derive(Debug, Deserialize)]
pub(crate) struct TitleMapping {
    pub from: String,
    pub to: String,
}

/// One entry of `query.pages`.
///
/// Missing pages carry a `missing` marker (an empty string in format v1);
/// its shape is irrelevant, only its presence.
#[derive(Debug, Deserialize)]
pub(crate) struct Page {
    pub title: Option<String>,
    #[serde(default)]
    pub missing: Option<serde_json::Value>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// One entry of a page's `links` array.
#[derive(Debug, Deserialize)]
pub(crate) struct Link {
    pub title: String,
}

/// Result of parsing one sub-batch response.
#[derive(Debug, Default)]
pub(crate) struct ParsedBatch {
    /// Every requested title mapped to its filtered links (empty when the
    /// page is missing or was not returned).
    pub links: HashMap<String, Vec<String>>,
    /// Titles whose entries came from an actual page parse and are safe to
    /// cache. Missing or unreturned titles stay out so a later page creation
    /// becomes visible.
    pub cacheable: HashSet<String>,
}

/// Keeps a link when it is an article title: no namespace colon, with the
/// one exception of encyclopedic `List of ...` pages.
pub(crate) fn is_article_link(title: &str) -> bool {
    !title.contains(':') || title.starts_with("List of ")
}

/// Extracts `{requested title -> filtered links}` from one response.
///
/// Resolved page titles are mapped back through `redirects` and `normalized`
/// to every original spelling present in `requested`, so callers always find
/// results under the name they asked with. Requested titles left unmapped
/// get an explicit empty list.
pub(crate) fn parse_batch(data: QueryData, requested: &[String]) -> ParsedBatch {
    let requested_set: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let mut parsed = ParsedBatch::default();

    for page in data.pages.into_values() {
        let Some(title) = page.title else { continue };
        if page.missing.is_some() {
            continue;
        }

        let article_links: Vec<String> = page
            .links
            .into_iter()
            .map(|link| link.title)
            .filter(|title| is_article_link(title))
            .collect();

        for mapping in data.redirects.iter().chain(data.normalized.iter()) {
            if mapping.to == title && requested_set.contains(mapping.from.as_str()) {
                parsed
                    .links
                    .insert(mapping.from.clone(), article_links.clone());
                parsed.cacheable.insert(mapping.from.clone());
            }
        }

        parsed.cacheable.insert(title.clone());
        parsed.links.insert(title, article_links);
    }

    for title in requested {
        if !parsed.links.contains_key(title) {
            parsed.links.insert(title.clone(), Vec::new());
        }
    }

    parsed
}
