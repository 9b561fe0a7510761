//! Shortest-link-path search between Wikipedia pages.
//!
//! The engine runs a breadth-first search whose frontier queue, visited set,
//! and per-vertex path chains live in a shared key/value store rather than
//! worker memory, so searches can outgrow one process and orphaned state is
//! reclaimed by TTL. Link expansion goes through a batched, cached MediaWiki
//! client, and searches execute on a background worker pool with progress
//! reporting and retry.
//!
//! Module map:
//!
//! - [`engine`] — the [`PathFinder`](engine::PathFinder) trait and its BFS and
//!   bidirectional implementations
//! - [`service`] — request-level orchestration: search, explore, cache admin
//! - [`tasks`] — background execution: worker pool, retries, timeouts,
//!   housekeeping
//! - [`registry`] — process-wide wiring of the shared handles
//! - [`config`] — environment-driven configuration

#![warn(missing_docs)]

pub mod cancel;
pub mod config;
pub mod engine;
pub mod registry;
pub mod service;
pub mod tasks;

pub use cancel::CancelFlag;
pub use config::Config;
pub use engine::{BfsPathFinder, BidirectionalPathFinder, PathFinder};
pub use registry::Services;
pub use service::{CacheAdmin, ExploreService, SearchService};
pub use tasks::{TaskJob, TaskRuntime};

pub use wikihop_core::{Error, Result};
