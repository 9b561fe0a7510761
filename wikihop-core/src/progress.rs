//! Advisory progress reporting from the engine.

use async_trait::async_trait;

use crate::model::SearchProgress;

/// Receiver for progress snapshots emitted during a search.
///
/// The sink is advisory: the engine never changes behavior based on it, and
/// implementations must not mutate engine state. The task runtime uses this
/// to publish fine-grained task progress.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Called with a snapshot every few frontier pops.
    async fn report(&self, progress: &SearchProgress);
}

/// Sink that discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

#[async_trait]
impl ProgressSink for NoopProgress {
    async fn report(&self, _progress: &SearchProgress) {}
}
