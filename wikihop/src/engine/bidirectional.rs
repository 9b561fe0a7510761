//! Bidirectional search hook.

use std::sync::Arc;

use async_trait::async_trait;
use wikihop_core::{LinkSource, Queue, Result, SearchOutcome, Store};

use super::{BfsPathFinder, PathFinder};

/// Two-frontier search placeholder.
///
/// Keeps the `bidirectional` algorithm selectable while delegating to the
/// unidirectional engine. A real implementation would expand the smaller of
/// two frontiers (one rooted at each endpoint, with the reverse side needing
/// incoming-link data) and splice the forward and reverse chains at the
/// first shared visited page.
pub struct BidirectionalPathFinder {
    inner: BfsPathFinder,
}

impl BidirectionalPathFinder {
    /// Creates the finder over the same adapters as the BFS engine.
    pub fn new(
        source: Arc<dyn LinkSource>,
        store: Arc<dyn Store>,
        queue: Arc<dyn Queue>,
    ) -> Self {
        Self {
            inner: BfsPathFinder::new(source, store, queue),
        }
    }

    /// Sets the depth bound on the delegate engine.
    #[must_use]
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.inner = self.inner.max_depth(max_depth);
        self
    }

    /// Attaches a cancellation flag on the delegate engine.
    #[must_use]
    pub fn cancel_flag(mut self, cancel: crate::cancel::CancelFlag) -> Self {
        self.inner = self.inner.cancel_flag(cancel);
        self
    }

    /// Attaches a progress sink on the delegate engine.
    #[must_use]
    pub fn progress(mut self, progress: Arc<dyn wikihop_core::ProgressSink>) -> Self {
        self.inner = self.inner.progress(progress);
        self
    }
}

#[async_trait]
impl PathFinder for BidirectionalPathFinder {
    async fn find(&self, start: &str, end: &str) -> Result<SearchOutcome> {
        self.inner.find(start, end).await
    }
}
