//! HTTP contract tests over in-memory backends and a scripted link source.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{Value, json};
use wikihop::{Config, Services};
use wikihop_core::{LinkSource, Result};
use wikihop_memory::MemoryStore;

/// Deterministic link source; every page exists unless listed missing.
#[derive(Default)]
struct StubLinkSource {
    graph: HashMap<String, Vec<String>>,
    missing: HashSet<String>,
}

impl StubLinkSource {
    fn from_graph(edges: &[(&str, &[&str])]) -> Self {
        let graph = edges
            .iter()
            .map(|(page, links)| {
                (
                    (*page).to_owned(),
                    links.iter().map(|link| (*link).to_owned()).collect(),
                )
            })
            .collect();
        Self {
            graph,
            ..Self::default()
        }
    }

    fn with_missing(mut self, titles: &[&str]) -> Self {
        self.missing = titles.iter().map(|title| (*title).to_owned()).collect();
        self
    }
}

#[async_trait]
impl LinkSource for StubLinkSource {
    async fn links_bulk(&self, titles: &[String]) -> Result<HashMap<String, Vec<String>>> {
        Ok(titles
            .iter()
            .map(|title| {
                (
                    title.clone(),
                    self.graph.get(title).cloned().unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn page_exists(&self, title: &str) -> bool {
        !self.missing.contains(title)
    }
}

fn services(source: StubLinkSource) -> Services {
    let store = Arc::new(MemoryStore::new());
    let mut config = Config::default();
    config.worker_count = 1;
    Services::with_parts(config, store.clone(), store, Arc::new(source))
}

fn server(source: StubLinkSource) -> (TestServer, Services) {
    let services = services(source);
    let server = TestServer::new(wikihop_server::app(services.clone())).unwrap();
    (server, services)
}

#[tokio::test]
async fn get_path_accepts_and_returns_a_task_handle() {
    let (server, _services) = server(StubLinkSource::from_graph(&[("A", &["B"])]));

    let response = server
        .post("/getPath")
        .json(&json!({"start": "A", "end": "B"}))
        .await;
    response.assert_status(axum::http::StatusCode::ACCEPTED);

    let body: Value = response.json();
    assert_eq!(body["status"], "IN_PROGRESS");
    assert_eq!(body["start_page"], "A");
    assert_eq!(body["end_page"], "B");
    let task_id = body["task_id"].as_str().unwrap();
    assert_eq!(
        body["poll_url"],
        format!("/tasks/status/{task_id}").as_str()
    );
}

#[tokio::test]
async fn get_path_rejects_equal_titles() {
    let (server, _services) = server(StubLinkSource::from_graph(&[]));

    let response = server
        .post("/getPath")
        .json(&json!({"start": "Same", "end": "Same"}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn get_path_rejects_non_json_bodies() {
    let (server, _services) = server(StubLinkSource::from_graph(&[]));

    let response = server
        .post("/getPath")
        .text("start=A&end=B")
        .content_type("text/plain")
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_CONTENT_TYPE");
}

#[tokio::test]
async fn unknown_tasks_poll_as_pending() {
    let (server, _services) = server(StubLinkSource::from_graph(&[]));

    let response = server.get("/tasks/status/no-such-task").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["task_id"], "no-such-task");
}

#[tokio::test]
async fn finished_tasks_report_their_result() {
    let (server, services) =
        server(StubLinkSource::from_graph(&[("A", &["X"]), ("X", &["B"])]));

    let response = server
        .post("/getPath")
        .json(&json!({"start": "A", "end": "B"}))
        .await;
    let task_id = response.json::<Value>()["task_id"]
        .as_str()
        .unwrap()
        .to_owned();

    assert!(services.runtime().process_one("worker-0").await.unwrap());

    let response = server.get(&format!("/tasks/status/{task_id}")).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["result"]["path"], json!(["A", "X", "B"]));
    assert_eq!(body["result"]["length"], 3);
    assert!(body["result"]["nodes_explored"].is_u64());
    assert!(body["result"]["search_time"].is_f64());
}

#[tokio::test]
async fn failed_tasks_report_the_error_code() {
    let (server, services) =
        server(StubLinkSource::from_graph(&[("A", &["B"])]).with_missing(&["Ghost"]));

    let response = server
        .post("/getPath")
        .json(&json!({"start": "A", "end": "Ghost"}))
        .await;
    let task_id = response.json::<Value>()["task_id"]
        .as_str()
        .unwrap()
        .to_owned();

    services.runtime().process_one("worker-0").await.unwrap();

    let body: Value = server.get(&format!("/tasks/status/{task_id}")).await.json();
    assert_eq!(body["status"], "FAILURE");
    assert_eq!(body["code"], "INVALID_PAGE");
    assert!(
        body["error"].as_str().unwrap().contains("Ghost"),
        "error message names the page: {body}"
    );
}

#[tokio::test]
async fn explore_returns_the_star_graph() {
    let (server, _services) =
        server(StubLinkSource::from_graph(&[("Hub", &["A", "B", "C"])]));

    let response = server
        .post("/explore")
        .json(&json!({"start": "Hub", "max_links": 2}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["start_page"], "Hub");
    assert_eq!(body["nodes"], json!(["Hub", "A", "B"]));
    assert_eq!(body["total_links"], 3);
}

#[tokio::test]
async fn explore_rejects_missing_pages() {
    let (server, _services) =
        server(StubLinkSource::from_graph(&[]).with_missing(&["Ghost"]));

    let response = server.post("/explore").json(&json!({"start": "Ghost"})).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INVALID_PAGE");
}

#[tokio::test]
async fn explore_rejects_out_of_range_caps() {
    let (server, _services) = server(StubLinkSource::from_graph(&[]));

    let response = server
        .post("/explore")
        .json(&json!({"start": "Hub", "max_links": 51}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn cache_clear_defaults_to_the_link_namespace() {
    let (server, _services) = server(StubLinkSource::from_graph(&[]));

    let response = server.post("/cache/clear").json(&json!({})).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["pattern"], "wiki_links:*");
}

#[tokio::test]
async fn cache_clear_honors_an_explicit_pattern() {
    let (server, _services) = server(StubLinkSource::from_graph(&[]));

    let response = server
        .post("/cache/clear")
        .json(&json!({"pattern": "path:*"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["pattern"], "path:*");
}

#[tokio::test]
async fn health_reports_per_dependency_status() {
    let (server, _services) = server(StubLinkSource::from_graph(&[]));

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["redis_status"], "healthy");
    assert_eq!(body["cache_status"], "healthy");
    assert_eq!(body["wikipedia_api_status"], "healthy");
}

#[tokio::test]
async fn index_lists_the_endpoints() {
    let (server, _services) = server(StubLinkSource::from_graph(&[]));

    let body: Value = server.get("/").await.json();
    assert_eq!(body["name"], "Wikihop Pathfinder API");
    assert!(body["endpoints"]["POST /getPath"].is_string());
}

#[tokio::test]
async fn unknown_routes_return_the_error_envelope() {
    let (server, _services) = server(StubLinkSource::from_graph(&[]));

    let response = server.get("/nope").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");
}
