//! Pathfinding engines.
//!
//! [`PathFinder`] is the seam between the task runtime and the search
//! algorithm. [`BfsPathFinder`] is the contractual implementation;
//! [`BidirectionalPathFinder`] is a named extension point that currently
//! delegates to it.

mod bfs;
mod bidirectional;

use async_trait::async_trait;
use wikihop_core::{Result, SearchOutcome};

pub use bfs::BfsPathFinder;
pub use bidirectional::BidirectionalPathFinder;

/// A shortest-path search between two page titles.
#[async_trait]
pub trait PathFinder: Send + Sync {
    /// Finds the shortest link chain from `start` to `end`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPage`](wikihop_core::Error::InvalidPage) when a
    ///   title is empty or the page does not exist
    /// - [`Error::PathNotFound`](wikihop_core::Error::PathNotFound) when the
    ///   frontier drains or the depth bound is reached
    /// - [`Error::Upstream`](wikihop_core::Error::Upstream) and
    ///   [`Error::Store`](wikihop_core::Error::Store) pass through for the
    ///   task runtime to classify
    async fn find(&self, start: &str, end: &str) -> Result<SearchOutcome>;
}
