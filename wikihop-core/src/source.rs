//! The upstream link provider seam.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// Provider of page-to-page link data.
///
/// The production implementation talks to a MediaWiki API; tests script this
/// trait with a deterministic `{title -> links}` map.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Outgoing article links for each requested title.
    ///
    /// Every input title maps to a list in the output, empty when the page
    /// is missing or has no article links. Duplicated input titles are
    /// tolerated. Fails as a whole with
    /// [`Error::Upstream`](crate::Error::Upstream) when any part of the
    /// lookup fails; partial results are never returned.
    async fn links_bulk(&self, titles: &[String]) -> Result<HashMap<String, Vec<String>>>;

    /// Best-effort existence probe for a single title.
    ///
    /// Returns `false` rather than an error when the upstream is
    /// unreachable.
    async fn page_exists(&self, title: &str) -> bool;
}
