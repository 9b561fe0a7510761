//! Request-level orchestration over the engine and the shared store.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use wikihop_core::{
    Error, ExploreRequest, ExploreResult, JsonStore, LinkSource, PathResult, Result,
    SearchRequest, Store, keys,
};

use crate::engine::PathFinder;

/// Orchestrates one search request: validation, result caching, timing.
///
/// Engine errors (`InvalidPage`, `PathNotFound`, `Store`, `Upstream`) pass
/// through unchanged so the task runtime can classify them.
pub struct SearchService {
    finder: Arc<dyn PathFinder>,
    store: Arc<dyn Store>,
    source: Arc<dyn LinkSource>,
}

impl SearchService {
    /// Creates the service over an engine, the shared store, and the link
    /// source used for page validation.
    pub fn new(
        finder: Arc<dyn PathFinder>,
        store: Arc<dyn Store>,
        source: Arc<dyn LinkSource>,
    ) -> Self {
        Self {
            finder,
            store,
            source,
        }
    }

    /// Finds the shortest path for `request`, serving and populating the
    /// result cache at `path:{start}:{end}`.
    ///
    /// Only successful results are cached; a `PathNotFound` outcome is
    /// recomputed on every request.
    pub async fn find_path(&self, request: &SearchRequest) -> Result<PathResult> {
        if !request.validate() {
            return Err(Error::InvalidPage(
                "invalid search request: start and end pages must be non-empty and different"
                    .to_owned(),
            ));
        }
        let start = request.start.trim();
        let end = request.end.trim();

        let cache_key = keys::path_result(start, end);
        if let Some(cached) = self.store.get_json::<PathResult>(&cache_key).await? {
            info!(start, end, "path served from result cache");
            return Ok(cached);
        }

        let timer = Instant::now();
        let outcome = self.finder.find(start, end).await?;
        let search_time = timer.elapsed().as_secs_f64();

        let result = PathResult {
            length: outcome.path.len(),
            path: outcome.path,
            start_page: start.to_owned(),
            end_page: end.to_owned(),
            search_time,
            nodes_explored: outcome.nodes_explored,
        };

        self.store
            .set_json(&cache_key, &result, Some(keys::PATH_CACHE_TTL))
            .await?;
        info!(
            start,
            end,
            length = result.length,
            search_time,
            "path found"
        );
        Ok(result)
    }

    /// Checks that both endpoints exist upstream.
    pub async fn validate_pages(&self, start: &str, end: &str) -> (bool, bool) {
        let start_exists = self.source.page_exists(start).await;
        let end_exists = self.source.page_exists(end).await;
        (start_exists, end_exists)
    }
}

/// Expands one page's outgoing links into a star graph for visualization.
pub struct ExploreService {
    source: Arc<dyn LinkSource>,
    store: Arc<dyn Store>,
}

impl ExploreService {
    /// Creates the service over the link source and the shared store.
    pub fn new(source: Arc<dyn LinkSource>, store: Arc<dyn Store>) -> Self {
        Self { source, store }
    }

    /// Builds the explore graph for `request`, cached 30 minutes at
    /// `explore:{start}:{max_links}`.
    pub async fn explore(&self, request: &ExploreRequest) -> Result<ExploreResult> {
        if !request.validate() {
            return Err(Error::InvalidPage("invalid explore request".to_owned()));
        }
        let start = request.start.trim();

        let cache_key = keys::explore(start, request.max_links);
        if let Some(cached) = self.store.get_json::<ExploreResult>(&cache_key).await? {
            debug!(start, "explore served from cache");
            return Ok(cached);
        }

        if !self.source.page_exists(start).await {
            return Err(Error::InvalidPage(format!(
                "page '{start}' does not exist"
            )));
        }

        let mut by_title = self.source.links_bulk(&[start.to_owned()]).await?;
        let all_links = by_title.remove(start).unwrap_or_default();
        if all_links.is_empty() {
            return Ok(ExploreResult {
                start_page: start.to_owned(),
                nodes: vec![start.to_owned()],
                edges: Vec::new(),
                total_links: 0,
            });
        }

        let total_links = all_links.len();
        let shown = &all_links[..request.max_links.min(total_links)];

        let mut nodes = Vec::with_capacity(shown.len() + 1);
        nodes.push(start.to_owned());
        nodes.extend(shown.iter().cloned());
        let edges = shown
            .iter()
            .map(|link| (start.to_owned(), link.clone()))
            .collect();

        let result = ExploreResult {
            start_page: start.to_owned(),
            nodes,
            edges,
            total_links,
        };
        self.store
            .set_json(&cache_key, &result, Some(keys::EXPLORE_CACHE_TTL))
            .await?;
        info!(start, shown = shown.len(), total_links, "explore complete");
        Ok(result)
    }
}

/// Administrative cache operations.
pub struct CacheAdmin {
    store: Arc<dyn Store>,
}

impl CacheAdmin {
    /// Creates the admin facade over the shared store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Deletes every key matching `pattern` and returns the count.
    pub async fn clear(&self, pattern: &str) -> Result<u64> {
        let cleared = self.store.clear_pattern(pattern).await?;
        info!(pattern, cleared, "cache cleared by pattern");
        Ok(cleared)
    }
}
