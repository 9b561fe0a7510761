//! Domain model: search and explore requests, results, and task records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pathfinding algorithm selector.
///
/// `Bidirectional` is a named extension point; the current engine delegates
/// it to the unidirectional implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Standard breadth-first search from the start page.
    #[default]
    Bfs,
    /// Two-frontier search meeting in the middle.
    Bidirectional,
}

/// A request to find the shortest link chain between two pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Title of the page the path must begin at.
    pub start: String,
    /// Title of the page the path must end at.
    pub end: String,
    /// Algorithm to use. Defaults to [`Algorithm::Bfs`].
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Advisory depth bound (1..=10). The engine runs with the configured
    /// maximum; this value is echoed back to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
}

impl SearchRequest {
    /// Creates a BFS request between two titles.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            algorithm: Algorithm::Bfs,
            max_depth: None,
        }
    }

    /// Checks that both titles are non-empty after trimming, that they
    /// differ, and that `max_depth` (when present) is within 1..=10.
    pub fn validate(&self) -> bool {
        let start = self.start.trim();
        let end = self.end.trim();
        !start.is_empty()
            && !end.is_empty()
            && start != end
            && self.max_depth.is_none_or(|d| (1..=10).contains(&d))
    }
}

/// A request to expand one page's outgoing links for visualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreRequest {
    /// Title of the page to expand.
    pub start: String,
    /// Maximum number of links to include (1..=50).
    #[serde(default = "default_max_links")]
    pub max_links: usize,
}

fn default_max_links() -> usize {
    10
}

impl ExploreRequest {
    /// Checks that the title is non-empty after trimming and that the link
    /// cap is within 1..=50.
    pub fn validate(&self) -> bool {
        !self.start.trim().is_empty() && (1..=50).contains(&self.max_links)
    }
}

/// What the engine returns: the path plus how many frontier pops it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Shortest path, start title first, end title last.
    pub path: Vec<String>,
    /// Number of pages popped from the frontier.
    pub nodes_explored: u64,
}

/// Completed search result, as cached and returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    /// Shortest path, start title first, end title last.
    pub path: Vec<String>,
    /// Number of titles in `path`.
    pub length: usize,
    /// Title the search started from.
    pub start_page: String,
    /// Title the search ended at.
    pub end_page: String,
    /// Wall-clock seconds the engine ran for.
    pub search_time: f64,
    /// Number of pages popped from the frontier.
    pub nodes_explored: u64,
}

impl PathResult {
    /// Structural invariants: endpoints match, length is consistent, and the
    /// path has at least two hops unless it is the same-page singleton.
    pub fn is_valid(&self) -> bool {
        let endpoints_ok = self.path.first().is_some_and(|p| *p == self.start_page)
            && self.path.last().is_some_and(|p| *p == self.end_page);
        let length_ok = self.length == self.path.len()
            && (self.length >= 2 || (self.length == 1 && self.start_page == self.end_page));
        endpoints_ok && length_ok
    }
}

/// Result of an explore request: a star graph around the start page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreResult {
    /// The expanded page.
    pub start_page: String,
    /// The start page followed by its (capped) outgoing links.
    pub nodes: Vec<String>,
    /// `(start_page, link)` pairs, one per included link.
    pub edges: Vec<(String, String)>,
    /// Total number of outgoing article links before capping.
    pub total_links: usize,
}

/// Advisory progress snapshot emitted by the engine every few pops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Human-readable phase description.
    pub status: String,
    /// Frontier pops so far.
    pub nodes_explored: u64,
    /// Depth of the most recently popped page.
    pub current_depth: u32,
    /// Title of the most recently popped page.
    pub last_node: String,
    /// Current frontier queue length.
    pub queue_size: u64,
    /// Seconds elapsed since the search started.
    pub elapsed_s: f64,
}

/// Lifecycle states of a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Submitted, not yet picked up by a worker.
    Pending,
    /// A worker is running the search.
    Progress,
    /// Finished with a result.
    Success,
    /// Finished with a terminal error.
    Failure,
    /// Waiting out the backoff before the next attempt.
    Retry,
}

/// Coarse progress metadata published at task checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Checkpoint percentage (0..=100).
    pub percent: u8,
    /// Human-readable checkpoint description.
    pub status: String,
    /// Fine-grained engine progress, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchProgress>,
}

/// Terminal error recorded on a failed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    /// Stable machine-readable code (`INVALID_PAGE`, `PATH_NOT_FOUND`, ...).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Persisted state of one background task, keyed by its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task identifier handed back to the client at submission.
    pub task_id: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Title the search starts from.
    pub start_page: String,
    /// Title the search ends at.
    pub end_page: String,
    /// Latest progress checkpoint, while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<TaskProgress>,
    /// Final result, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PathResult>,
    /// Terminal error, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
    /// Number of retries performed so far.
    #[serde(default)]
    pub retry_count: u32,
    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// A fresh `PENDING` record for a just-submitted request.
    pub fn pending(task_id: impl Into<String>, request: &SearchRequest) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            start_page: request.start.clone(),
            end_page: request.end.clone(),
            progress: None,
            result: None,
            error: None,
            retry_count: 0,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_validation() {
        assert!(SearchRequest::new("Rust (programming language)", "Ferris").validate());
        assert!(!SearchRequest::new("", "B").validate());
        assert!(!SearchRequest::new("A", "   ").validate());
        assert!(!SearchRequest::new("Same", "Same").validate());

        let mut req = SearchRequest::new("A", "B");
        req.max_depth = Some(10);
        assert!(req.validate());
        req.max_depth = Some(11);
        assert!(!req.validate());
        req.max_depth = Some(0);
        assert!(!req.validate());
    }

    #[test]
    fn explore_request_validation() {
        let req = ExploreRequest {
            start: "Graph theory".into(),
            max_links: 10,
        };
        assert!(req.validate());
        assert!(
            !ExploreRequest {
                start: " ".into(),
                max_links: 10
            }
            .validate()
        );
        assert!(
            !ExploreRequest {
                start: "A".into(),
                max_links: 51
            }
            .validate()
        );
    }

    #[test]
    fn request_defaults_from_json() {
        let req: SearchRequest = serde_json::from_str(r#"{"start": "A", "end": "B"}"#).unwrap();
        assert_eq!(req.algorithm, Algorithm::Bfs);
        assert_eq!(req.max_depth, None);

        let req: SearchRequest =
            serde_json::from_str(r#"{"start": "A", "end": "B", "algorithm": "bidirectional"}"#)
                .unwrap();
        assert_eq!(req.algorithm, Algorithm::Bidirectional);
    }

    #[test]
    fn path_result_invariants() {
        let ok = PathResult {
            path: vec!["A".into(), "X".into(), "B".into()],
            length: 3,
            start_page: "A".into(),
            end_page: "B".into(),
            search_time: 0.5,
            nodes_explored: 2,
        };
        assert!(ok.is_valid());

        let singleton = PathResult {
            path: vec!["A".into()],
            length: 1,
            start_page: "A".into(),
            end_page: "A".into(),
            search_time: 0.0,
            nodes_explored: 1,
        };
        assert!(singleton.is_valid());

        let bad_length = PathResult {
            length: 2,
            ..ok.clone()
        };
        assert!(!bad_length.is_valid());

        let bad_endpoint = PathResult {
            end_page: "C".into(),
            ..ok
        };
        assert!(!bad_endpoint.is_valid());
    }

    #[test]
    fn task_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::Retry).unwrap(),
            "\"RETRY\""
        );
    }

    #[test]
    fn task_record_round_trip() {
        let record = TaskRecord::pending("abc123", &SearchRequest::new("A", "B"));
        let json = serde_json::to_string(&record).unwrap();
        let back: TaskRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.status, TaskStatus::Pending);
    }
}
