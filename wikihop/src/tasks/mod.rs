//! Background execution of searches.
//!
//! [`TaskRuntime`] owns a pool of workers consuming pathfinding jobs from a
//! broker queue on the shared store. Submission returns a stable task id
//! immediately; workers run one job at a time through an attempt loop with
//! retry classification, soft and hard time limits, and progress reporting
//! into the persisted [`TaskRecord`](wikihop_core::TaskRecord). Two interval
//! tasks handle housekeeping: an hourly session sweep and a five-minute
//! liveness self-check.

mod housekeeping;
mod state;
mod worker;

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;
use wikihop_core::{
    Error, JsonQueue, LinkSource, Queue, Result, SearchRequest, Store, TaskRecord, keys,
};

use crate::cancel::CancelFlag;
use crate::config::Config;

pub use state::TaskStateStore;

/// One queued pathfinding job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskJob {
    /// Id handed back to the client at submission.
    pub task_id: String,
    /// The search to run.
    pub request: SearchRequest,
}

pub(crate) struct RuntimeInner {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) queue: Arc<dyn Queue>,
    pub(crate) source: Arc<dyn LinkSource>,
    pub(crate) config: Config,
    pub(crate) states: TaskStateStore,
    pub(crate) shutdown: CancelFlag,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

/// Worker pool and submission surface for background searches.
///
/// Cloning shares the runtime.
#[derive(Clone)]
pub struct TaskRuntime {
    inner: Arc<RuntimeInner>,
}

impl TaskRuntime {
    /// Creates a runtime over the shared adapters. Workers do not run until
    /// [`start`](Self::start) is called.
    pub fn new(
        store: Arc<dyn Store>,
        queue: Arc<dyn Queue>,
        source: Arc<dyn LinkSource>,
        config: Config,
    ) -> Self {
        let states = TaskStateStore::new(store.clone());
        Self {
            inner: Arc::new(RuntimeInner {
                store,
                queue,
                source,
                config,
                states,
                shutdown: CancelFlag::new(),
                handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Enqueues a search and returns its task id.
    ///
    /// Writes the `PENDING` record before pushing the job, so a poll that
    /// races the worker still sees the task.
    pub async fn submit(&self, request: SearchRequest) -> Result<String> {
        if !request.validate() {
            return Err(Error::InvalidPage(
                "invalid search request: start and end pages must be non-empty and different"
                    .to_owned(),
            ));
        }
        let task_id = Uuid::new_v4().to_string();
        let record = TaskRecord::pending(&task_id, &request);
        self.inner.states.save(&record).await?;
        self.inner
            .queue
            .push_json(
                keys::TASK_QUEUE,
                &TaskJob {
                    task_id: task_id.clone(),
                    request,
                },
            )
            .await?;
        info!(%task_id, "task submitted");
        Ok(task_id)
    }

    /// Loads the current record for `task_id`, `None` when unknown or
    /// expired.
    pub async fn status(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        self.inner.states.load(task_id).await
    }

    /// Spawns the worker pool and the housekeeping tasks. Idempotent.
    pub fn start(&self) {
        let mut handles = self.inner.handles.lock().expect("runtime handle lock");
        if !handles.is_empty() {
            return;
        }
        for index in 0..self.inner.config.worker_count {
            let worker_id = format!("worker-{index}");
            handles.push(tokio::spawn(worker::worker_loop(
                self.inner.clone(),
                worker_id,
            )));
        }
        handles.push(tokio::spawn(housekeeping::session_sweep_loop(
            self.inner.clone(),
        )));
        let runtime_id = Uuid::new_v4().to_string();
        handles.push(tokio::spawn(housekeeping::health_loop(
            self.inner.clone(),
            runtime_id,
        )));
        info!(
            workers = self.inner.config.worker_count,
            "task runtime started"
        );
    }

    /// Pops and runs at most one queued job, claiming it under `worker_id`.
    /// Returns whether a job was processed. This is the single-step form of
    /// the worker loop, used directly by tests.
    pub async fn process_one(&self, worker_id: &str) -> Result<bool> {
        worker::claim_and_run(&self.inner, worker_id).await
    }

    /// Requeues any job a previous incarnation of `worker_id` left in
    /// flight.
    pub async fn recover_worker(&self, worker_id: &str) {
        worker::requeue_inflight(&self.inner, worker_id).await;
    }

    /// Stops the worker pool and housekeeping tasks.
    ///
    /// Workers are aborted rather than drained; a job caught mid-flight is
    /// redelivered from its in-flight record on the next start.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut handles = self.inner.handles.lock().expect("runtime handle lock");
        for handle in handles.drain(..) {
            handle.abort();
        }
        info!("task runtime stopped");
    }
}
