//! Key construction for every namespace the service stores.
//!
//! All keys are built here so the prefix layout stays in one place. Search
//! session namespaces (`bfs_*`) are private to the worker that owns the
//! session id; `wiki_links:*`, `path:*`, and `explore:*` are shared
//! last-writer-wins caches.

use std::time::Duration;

/// TTL for search session state (queue, visited markers, path chains).
pub const SESSION_TTL: Duration = Duration::from_secs(3600);

/// TTL for cached link lists.
pub const LINK_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// TTL for cached path results.
pub const PATH_CACHE_TTL: Duration = Duration::from_secs(3600);

/// TTL for cached explore results.
pub const EXPLORE_CACHE_TTL: Duration = Duration::from_secs(1800);

/// TTL for task records.
pub const TASK_TTL: Duration = Duration::from_secs(3600);

/// Glob matching every search session namespace, for housekeeping sweeps.
pub const SESSION_SWEEP_PATTERN: &str = "bfs_*";

/// Broker queue the task runtime consumes pathfinding jobs from.
pub const TASK_QUEUE: &str = "tasks:pathfinding";

/// Cached outgoing links of a page.
pub fn wiki_links(title: &str) -> String {
    format!("wiki_links:{title}")
}

/// Cached result of a completed search.
pub fn path_result(start: &str, end: &str) -> String {
    format!("path:{start}:{end}")
}

/// Cached result of an explore request.
pub fn explore(start: &str, max_links: usize) -> String {
    format!("explore:{start}:{max_links}")
}

/// Frontier queue of one search session.
pub fn bfs_queue(sid: &str) -> String {
    format!("bfs_queue:{sid}")
}

/// Visited marker for one title in one session.
pub fn bfs_visited(sid: &str, title: &str) -> String {
    format!("bfs_visited:{sid}:{title}")
}

/// Glob matching all visited markers of one session.
pub fn bfs_visited_pattern(sid: &str) -> String {
    format!("bfs_visited:{sid}:*")
}

/// Predecessor chain for one title in one session.
pub fn bfs_paths(sid: &str, title: &str) -> String {
    format!("bfs_paths:{sid}:{title}")
}

/// Glob matching all predecessor chains of one session.
pub fn bfs_paths_pattern(sid: &str) -> String {
    format!("bfs_paths:{sid}:*")
}

/// Persisted state of one background task.
pub fn task(task_id: &str) -> String {
    format!("task:{task_id}")
}

/// The job a worker currently has in flight, for redelivery after a crash.
pub fn worker_inflight(worker: &str) -> String {
    format!("tasks:inflight:{worker}")
}

/// Liveness record written by each worker's periodic self-check.
pub fn worker_health(worker: &str) -> String {
    format!("health:worker:{worker}")
}
