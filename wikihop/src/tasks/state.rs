//! Task record persistence and progress publishing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use wikihop_core::{
    JsonStore, ProgressSink, Result, SearchProgress, Store, TaskProgress, TaskRecord, TaskStatus,
    keys,
};

/// Reads and writes [`TaskRecord`]s in the shared store, TTL-bounded so
/// finished tasks expire after an hour.
#[derive(Clone)]
pub struct TaskStateStore {
    store: Arc<dyn Store>,
}

impl TaskStateStore {
    /// Creates the state store over the shared store handle.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Persists `record` at `task:{id}`.
    pub async fn save(&self, record: &TaskRecord) -> Result<()> {
        self.store
            .set_json(&keys::task(&record.task_id), record, Some(keys::TASK_TTL))
            .await?;
        Ok(())
    }

    /// Loads the record for `task_id`, `None` when it never existed or has
    /// expired.
    pub async fn load(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        Ok(self.store.get_json(&keys::task(task_id)).await?)
    }

    /// Best-effort coarse checkpoint write. Progress is advisory, so
    /// failures are logged and dropped.
    pub(crate) async fn checkpoint(&self, task_id: &str, percent: u8, status: &str) {
        let Ok(Some(mut record)) = self.load(task_id).await else {
            return;
        };
        record.status = TaskStatus::Progress;
        record.progress = Some(TaskProgress {
            percent,
            status: status.to_owned(),
            search: record.progress.take().and_then(|progress| progress.search),
        });
        record.updated_at = Utc::now();
        if let Err(err) = self.save(&record).await {
            debug!(task_id, %err, "checkpoint write failed");
        }
    }
}

/// Publishes fine-grained engine progress into the task record.
pub(crate) struct TaskProgressSink {
    states: TaskStateStore,
    task_id: String,
}

impl TaskProgressSink {
    pub(crate) fn new(states: TaskStateStore, task_id: impl Into<String>) -> Self {
        Self {
            states,
            task_id: task_id.into(),
        }
    }
}

#[async_trait]
impl ProgressSink for TaskProgressSink {
    async fn report(&self, progress: &SearchProgress) {
        let Ok(Some(mut record)) = self.states.load(&self.task_id).await else {
            return;
        };
        let percent = record.progress.as_ref().map_or(50, |current| current.percent);
        record.status = TaskStatus::Progress;
        record.progress = Some(TaskProgress {
            percent,
            status: progress.status.clone(),
            search: Some(progress.clone()),
        });
        record.updated_at = Utc::now();
        if let Err(err) = self.states.save(&record).await {
            debug!(task_id = %self.task_id, %err, "progress write failed");
        }
    }
}
