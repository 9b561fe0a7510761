//! Route handlers and router assembly.

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use wikihop::Services;
use wikihop_core::{ExploreRequest, SearchRequest, Store, TaskStatus};

use crate::error::ApiError;

/// Builds the router over a wired service registry.
pub fn app(services: Services) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/getPath", post(get_path))
        .route("/tasks/status/{task_id}", get(task_status))
        .route("/explore", post(explore))
        .route("/cache/clear", post(cache_clear))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(services)
}

async fn get_path(
    State(services): State<Services>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(ApiError::from_rejection)?;
    if !request.validate() {
        return Err(ApiError::validation(
            "start and end pages must be non-empty and different",
        ));
    }
    info!(start = %request.start, end = %request.end, "path request");

    let start_page = request.start.trim().to_owned();
    let end_page = request.end.trim().to_owned();
    let task_id = services.runtime().submit(request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "IN_PROGRESS",
            "task_id": task_id,
            "poll_url": format!("/tasks/status/{task_id}"),
            "start_page": start_page,
            "end_page": end_page,
        })),
    ))
}

async fn task_status(
    State(services): State<Services>,
    Path(task_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = services.runtime().status(&task_id).await?;
    let body = match record {
        None => pending_body(&task_id),
        Some(record) => match record.status {
            TaskStatus::Pending => pending_body(&task_id),
            TaskStatus::Progress => json!({
                "status": "IN_PROGRESS",
                "task_id": task_id,
                "progress": record.progress,
            }),
            TaskStatus::Retry => json!({
                "status": "RETRY",
                "task_id": task_id,
                "progress": record.progress,
                "retry_count": record.retry_count,
            }),
            TaskStatus::Success => {
                let result = record.result.map(|result| {
                    json!({
                        "path": result.path,
                        "length": result.length,
                        "search_time": result.search_time,
                        "nodes_explored": result.nodes_explored,
                    })
                });
                json!({
                    "status": "SUCCESS",
                    "task_id": task_id,
                    "result": result,
                })
            }
            TaskStatus::Failure => {
                let (message, code) = record
                    .error
                    .map(|error| (error.message, error.code))
                    .unwrap_or_else(|| ("task failed".to_owned(), "INTERNAL_ERROR".to_owned()));
                json!({
                    "status": "FAILURE",
                    "task_id": task_id,
                    "error": message,
                    "code": code,
                })
            }
        },
    };
    Ok(Json(body))
}

fn pending_body(task_id: &str) -> Value {
    json!({
        "status": "PENDING",
        "task_id": task_id,
        "message": "Task is waiting to be processed",
    })
}

async fn explore(
    State(services): State<Services>,
    payload: Result<Json<ExploreRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(ApiError::from_rejection)?;
    if !request.validate() {
        return Err(ApiError::validation(
            "start page must be non-empty and max_links within 1..=50",
        ));
    }
    info!(
        start = %request.start,
        max_links = request.max_links,
        "explore request"
    );
    let result = services.explore_service().explore(&request).await?;
    Ok(Json(serde_json::to_value(result).map_err(|err| {
        ApiError::from(wikihop_core::Error::Internal(err.to_string()))
    })?))
}

#[derive(Debug, Deserialize)]
struct ClearCacheRequest {
    #[serde(default = "default_clear_pattern")]
    pattern: String,
}

fn default_clear_pattern() -> String {
    "wiki_links:*".to_owned()
}

async fn cache_clear(
    State(services): State<Services>,
    payload: Result<Json<ClearCacheRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    // A missing or empty body clears the default namespace.
    let pattern = payload
        .map(|Json(request)| request.pattern)
        .unwrap_or_else(|_| default_clear_pattern());
    let cleared = services.cache_admin().clear(&pattern).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Cleared {cleared} cache entries"),
        "pattern": pattern,
    })))
}

async fn health(State(services): State<Services>) -> impl IntoResponse {
    let store = services.store();

    let redis_status = match store.ping().await {
        Ok(()) => "healthy".to_owned(),
        Err(err) => format!("unhealthy: {err}"),
    };

    let cache_status = match cache_round_trip(&store).await {
        Ok(()) => "healthy".to_owned(),
        Err(message) => format!("unhealthy: {message}"),
    };

    // The upstream client exists once the registry is wired; no live API
    // call is made from the health endpoint.
    let wikipedia_status = "healthy".to_owned();

    let healthy = redis_status == "healthy" && cache_status == "healthy";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "redis_status": redis_status,
            "cache_status": cache_status,
            "wikipedia_api_status": wikipedia_status,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

async fn cache_round_trip(store: &std::sync::Arc<dyn Store>) -> Result<(), String> {
    let probe = bytes_probe();
    store
        .set("health_check", probe.clone(), Some(Duration::from_secs(60)))
        .await
        .map_err(|err| err.to_string())?;
    match store.get("health_check").await {
        Ok(Some(value)) if value == probe => Ok(()),
        Ok(_) => Err("cache round-trip mismatch".to_owned()),
        Err(err) => Err(err.to_string()),
    }
}

fn bytes_probe() -> bytes::Bytes {
    bytes::Bytes::from_static(b"\"ok\"")
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": "Wikihop Pathfinder API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Find shortest link paths between Wikipedia pages",
        "endpoints": {
            "POST /getPath": "Start pathfinding between two pages",
            "GET /tasks/status/{task_id}": "Check task status",
            "POST /explore": "Explore page connections",
            "POST /cache/clear": "Clear cache entries by pattern",
            "GET /health": "Health check",
            "GET /": "API information",
        },
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Endpoint not found",
            "code": "NOT_FOUND",
        })),
    )
}
