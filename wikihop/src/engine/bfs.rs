//! Store-backed breadth-first search.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use wikihop_core::{
    Error, JsonQueue, JsonStore, LinkSource, NoopProgress, ProgressSink, Queue, Result,
    SearchOutcome, SearchProgress, Store, keys,
};

use crate::cancel::CancelFlag;

use super::PathFinder;

/// How often the progress sink is invoked, in frontier pops.
const PROGRESS_EVERY: u64 = 3;

/// One queued frontier entry.
#[derive(Debug, Serialize, Deserialize)]
struct FrontierItem {
    page: String,
    depth: u32,
}

/// BFS engine whose entire working state lives in the shared store.
///
/// Each search allocates a fresh session id and keeps its frontier queue at
/// `bfs_queue:{sid}`, visited markers at `bfs_visited:{sid}:{title}`, and
/// full predecessor chains at `bfs_paths:{sid}:{title}`, all with a session
/// TTL so orphaned state expires on its own. The chains duplicate path
/// prefixes in exchange for goal-time reconstruction without a parent walk.
///
/// Expansion order follows the upstream API's link order, so the first
/// discovery of the target is shortest by hop count and ties resolve to the
/// first `(parent, link)` pair in pop order.
pub struct BfsPathFinder {
    source: Arc<dyn LinkSource>,
    store: Arc<dyn Store>,
    queue: Arc<dyn Queue>,
    max_depth: u32,
    batch_size: usize,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelFlag,
}

impl BfsPathFinder {
    /// Creates an engine with the default depth bound (6) and no progress
    /// reporting.
    pub fn new(
        source: Arc<dyn LinkSource>,
        store: Arc<dyn Store>,
        queue: Arc<dyn Queue>,
    ) -> Self {
        Self {
            source,
            store,
            queue,
            max_depth: 6,
            batch_size: 50,
            progress: Arc::new(NoopProgress),
            cancel: CancelFlag::new(),
        }
    }

    /// Sets the depth bound: pages deeper than this are never expanded.
    #[must_use]
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets how many discovered frontier items go into one queue round-trip.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Attaches a progress sink, invoked every few pops.
    #[must_use]
    pub fn progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Attaches a cancellation flag checked between pops.
    #[must_use]
    pub fn cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    async fn run_session(&self, sid: &str, start: &str, end: &str) -> Result<SearchOutcome> {
        let queue_key = keys::bfs_queue(sid);
        let started = Instant::now();

        self.queue
            .push_json(
                &queue_key,
                &FrontierItem {
                    page: start.to_owned(),
                    depth: 0,
                },
            )
            .await?;
        self.store
            .set_json(&keys::bfs_visited(sid, start), &true, Some(keys::SESSION_TTL))
            .await?;
        self.store
            .set_json(
                &keys::bfs_paths(sid, start),
                &vec![start.to_owned()],
                Some(keys::SESSION_TTL),
            )
            .await?;

        let mut nodes_explored: u64 = 0;

        while let Some(item) = self.queue.pop_json::<FrontierItem>(&queue_key).await? {
            if self.cancel.is_cancelled() {
                info!(sid, nodes_explored, "search cancelled at soft limit");
                return Err(Error::SoftTimeout);
            }

            let FrontierItem {
                page: current,
                depth,
            } = item;
            nodes_explored += 1;
            trace!(sid, %current, depth, nodes_explored, "expanding page");

            if nodes_explored % PROGRESS_EVERY == 0 {
                let queue_size = self.queue.length(&queue_key).await?;
                self.progress
                    .report(&SearchProgress {
                        status: "Searching...".to_owned(),
                        nodes_explored,
                        current_depth: depth,
                        last_node: current.clone(),
                        queue_size,
                        elapsed_s: started.elapsed().as_secs_f64(),
                    })
                    .await;
            }

            if depth > self.max_depth {
                // BFS pops in depth order, so nothing shallower remains.
                warn!(sid, depth, max_depth = self.max_depth, "depth bound reached");
                break;
            }

            let Some(current_path) = self
                .store
                .get_json::<Vec<String>>(&keys::bfs_paths(sid, &current))
                .await?
            else {
                warn!(sid, %current, "no stored path for page, skipping");
                continue;
            };

            let links = match self
                .source
                .links_bulk(std::slice::from_ref(&current))
                .await
            {
                Ok(mut by_title) => by_title.remove(&current).unwrap_or_default(),
                Err(err @ (Error::Upstream(_) | Error::Store(_))) => return Err(err),
                Err(err) => {
                    warn!(sid, %current, %err, "link expansion failed, skipping page");
                    continue;
                }
            };
            trace!(sid, %current, links = links.len(), "links fetched");

            let mut discovered = Vec::new();
            for link in links {
                if link == end {
                    let mut path = current_path;
                    path.push(link);
                    info!(
                        sid,
                        length = path.len(),
                        nodes_explored,
                        "path found"
                    );
                    return Ok(SearchOutcome {
                        path,
                        nodes_explored,
                    });
                }

                if self.store.exists(&keys::bfs_visited(sid, &link)).await? {
                    continue;
                }
                self.store
                    .set_json(&keys::bfs_visited(sid, &link), &true, Some(keys::SESSION_TTL))
                    .await?;

                let mut path = current_path.clone();
                path.push(link.clone());
                self.store
                    .set_json(&keys::bfs_paths(sid, &link), &path, Some(keys::SESSION_TTL))
                    .await?;

                discovered.push(FrontierItem {
                    page: link,
                    depth: depth + 1,
                });
            }

            for chunk in discovered.chunks(self.batch_size) {
                self.queue.push_batch_json(&queue_key, chunk).await?;
            }
        }

        warn!(sid, %start, %end, nodes_explored, "frontier exhausted without a path");
        Err(Error::PathNotFound {
            start: start.to_owned(),
            end: end.to_owned(),
        })
    }

    /// Best-effort removal of all session state. TTLs reclaim whatever a
    /// failed cleanup leaves behind.
    async fn cleanup(&self, sid: &str) {
        if let Err(err) = self.queue.clear(&keys::bfs_queue(sid)).await {
            warn!(sid, %err, "failed to clear session queue");
        }
        let mut cleared: u64 = 0;
        match self
            .store
            .clear_pattern(&keys::bfs_visited_pattern(sid))
            .await
        {
            Ok(count) => cleared += count,
            Err(err) => warn!(sid, %err, "failed to clear visited markers"),
        }
        match self.store.clear_pattern(&keys::bfs_paths_pattern(sid)).await {
            Ok(count) => cleared += count,
            Err(err) => warn!(sid, %err, "failed to clear path chains"),
        }
        debug!(sid, cleared, "session cleanup done");
    }
}

#[async_trait]
impl PathFinder for BfsPathFinder {
    async fn find(&self, start: &str, end: &str) -> Result<SearchOutcome> {
        let start = start.trim();
        let end = end.trim();
        if start.is_empty() || end.is_empty() {
            return Err(Error::InvalidPage(
                "start and end pages cannot be empty".to_owned(),
            ));
        }

        if start == end {
            return Ok(SearchOutcome {
                path: vec![start.to_owned()],
                nodes_explored: 1,
            });
        }

        if !self.source.page_exists(start).await {
            return Err(Error::InvalidPage(format!(
                "start page '{start}' does not exist"
            )));
        }
        if !self.source.page_exists(end).await {
            return Err(Error::InvalidPage(format!(
                "end page '{end}' does not exist"
            )));
        }

        let sid = Uuid::new_v4().to_string();
        info!(%sid, %start, %end, "starting search session");

        let result = self.run_session(&sid, start, end).await;
        self.cleanup(&sid).await;
        result
    }
}
