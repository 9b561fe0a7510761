//! Worker execution: claim, attempt loop, retry, timeouts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use wikihop_core::{
    Algorithm, Error, JsonQueue, JsonStore, PathResult, ProgressSink, Result, SearchRequest,
    Store, TaskError, TaskProgress, TaskRecord, TaskStatus, keys,
};

use crate::cancel::CancelFlag;
use crate::engine::{BfsPathFinder, BidirectionalPathFinder, PathFinder};
use crate::service::SearchService;

use super::state::TaskProgressSink;
use super::{RuntimeInner, TaskJob};

/// How long an idle worker sleeps between broker polls.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long a worker backs off after a broker error.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Consumes the broker queue until shutdown, one job at a time.
pub(crate) async fn worker_loop(inner: Arc<RuntimeInner>, worker_id: String) {
    requeue_inflight(&inner, &worker_id).await;
    while !inner.shutdown.is_cancelled() {
        match claim_and_run(&inner, &worker_id).await {
            Ok(true) => {}
            Ok(false) => tokio::time::sleep(POLL_INTERVAL).await,
            Err(err) => {
                warn!(worker_id, %err, "task queue poll failed");
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }
    }
    debug!(worker_id, "worker stopped");
}

/// Pops one job, records it in flight, runs it, then acknowledges by
/// deleting the in-flight record. Returns whether a job was processed.
///
/// The in-flight record is the late-ack analogue: a worker that dies
/// mid-task leaves it behind, and the next startup sweep pushes the job back
/// onto the broker instead of losing it.
pub(crate) async fn claim_and_run(inner: &Arc<RuntimeInner>, worker_id: &str) -> Result<bool> {
    let Some(job) = inner.queue.pop_json::<TaskJob>(keys::TASK_QUEUE).await? else {
        return Ok(false);
    };
    let inflight_key = keys::worker_inflight(worker_id);
    if let Err(err) = inner
        .store
        .set_json(&inflight_key, &job, Some(keys::TASK_TTL))
        .await
    {
        warn!(worker_id, %err, "failed to record in-flight job");
    }
    run_task(inner, job).await;
    if let Err(err) = inner.store.delete(&inflight_key).await {
        warn!(worker_id, %err, "failed to acknowledge finished job");
    }
    Ok(true)
}

/// Requeues a job a previous incarnation of this worker left in flight.
pub(crate) async fn requeue_inflight(inner: &Arc<RuntimeInner>, worker_id: &str) {
    let inflight_key = keys::worker_inflight(worker_id);
    match inner.store.get_json::<TaskJob>(&inflight_key).await {
        Ok(Some(job)) => {
            warn!(worker_id, task_id = %job.task_id, "requeuing job left in flight");
            if inner
                .queue
                .push_front_json(keys::TASK_QUEUE, &job)
                .await
                .is_ok()
            {
                let _ = inner.store.delete(&inflight_key).await;
            }
        }
        Ok(None) => {}
        Err(err) => warn!(worker_id, %err, "in-flight sweep failed"),
    }
}

/// The attempt loop for one job: run, classify, retry with fixed backoff,
/// persist the terminal state.
async fn run_task(inner: &Arc<RuntimeInner>, job: TaskJob) {
    let TaskJob { task_id, request } = job;
    info!(
        %task_id,
        start = %request.start,
        end = %request.end,
        "task picked up"
    );

    let mut record = match inner.states.load(&task_id).await {
        Ok(Some(record)) => record,
        _ => TaskRecord::pending(&task_id, &request),
    };

    let max_attempts = inner.config.task_max_retries + 1;
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        record.status = TaskStatus::Progress;
        record.retry_count = attempt - 1;
        record.progress = Some(TaskProgress {
            percent: 10,
            status: "Validating pages...".to_owned(),
            search: None,
        });
        record.updated_at = Utc::now();
        if let Err(err) = inner.states.save(&record).await {
            warn!(%task_id, %err, "failed to record task pickup");
        }

        match execute_attempt(inner, &task_id, &request).await {
            Ok(result) => {
                info!(
                    %task_id,
                    length = result.length,
                    nodes_explored = result.nodes_explored,
                    "task succeeded"
                );
                record.status = TaskStatus::Success;
                record.progress = Some(TaskProgress {
                    percent: 100,
                    status: "Complete".to_owned(),
                    search: None,
                });
                record.result = Some(result);
                record.error = None;
                record.updated_at = Utc::now();
                if let Err(err) = inner.states.save(&record).await {
                    warn!(%task_id, %err, "failed to persist task result");
                }
                return;
            }
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!(%task_id, attempt, %err, "retryable failure, backing off");
                record.status = TaskStatus::Retry;
                record.retry_count = attempt;
                record.progress = Some(TaskProgress {
                    percent: 0,
                    status: format!("Retrying due to: {err}"),
                    search: None,
                });
                record.updated_at = Utc::now();
                if let Err(err) = inner.states.save(&record).await {
                    warn!(%task_id, %err, "failed to record retry state");
                }
                tokio::time::sleep(inner.config.retry_backoff()).await;
            }
            Err(err) => {
                let (code, message) = if err.is_retryable() {
                    let exhausted = Error::RetriesExhausted(err.to_string());
                    (exhausted.code().to_owned(), exhausted.to_string())
                } else {
                    (err.code().to_owned(), err.to_string())
                };
                warn!(%task_id, attempt, %code, %err, "task failed");
                record.status = TaskStatus::Failure;
                record.progress = None;
                record.error = Some(TaskError { code, message });
                record.updated_at = Utc::now();
                if let Err(err) = inner.states.save(&record).await {
                    warn!(%task_id, %err, "failed to persist task failure");
                }
                return;
            }
        }
    }
}

/// One attempt under the soft and hard time limits.
///
/// The soft limit arms a cancellation flag the engine honors between pops;
/// the hard limit aborts the whole attempt, which counts as retryable.
async fn execute_attempt(
    inner: &Arc<RuntimeInner>,
    task_id: &str,
    request: &SearchRequest,
) -> Result<PathResult> {
    let cancel = CancelFlag::new();
    let soft_timer = {
        let cancel = cancel.clone();
        let limit = inner.config.soft_time_limit();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            cancel.cancel();
        })
    };

    let attempt = attempt_search(inner, task_id, request, cancel);
    let result = match tokio::time::timeout(inner.config.hard_time_limit(), attempt).await {
        Ok(result) => result,
        Err(_) => Err(Error::AttemptTimeout(inner.config.task_time_limit)),
    };
    soft_timer.abort();
    result
}

async fn attempt_search(
    inner: &Arc<RuntimeInner>,
    task_id: &str,
    request: &SearchRequest,
    cancel: CancelFlag,
) -> Result<PathResult> {
    let sink: Arc<dyn ProgressSink> =
        Arc::new(TaskProgressSink::new(inner.states.clone(), task_id));

    let finder: Arc<dyn PathFinder> = match request.algorithm {
        Algorithm::Bfs => Arc::new(
            BfsPathFinder::new(
                inner.source.clone(),
                inner.store.clone(),
                inner.queue.clone(),
            )
            .max_depth(inner.config.max_search_depth)
            .batch_size(inner.config.bfs_batch_size)
            .progress(sink)
            .cancel_flag(cancel),
        ),
        Algorithm::Bidirectional => Arc::new(
            BidirectionalPathFinder::new(
                inner.source.clone(),
                inner.store.clone(),
                inner.queue.clone(),
            )
            .max_depth(inner.config.max_search_depth)
            .progress(sink)
            .cancel_flag(cancel),
        ),
    };
    let service = SearchService::new(finder, inner.store.clone(), inner.source.clone());

    inner
        .states
        .checkpoint(task_id, 25, "Starting search...")
        .await;
    let result = service.find_path(request).await?;
    inner.states.checkpoint(task_id, 90, "Finalizing...").await;
    Ok(result)
}
