//! Core types and adapter traits for the wikihop pathfinding service.
//!
//! This crate defines the domain model (search requests, path results, task
//! records), the workspace error taxonomy, and the dyn-compatible traits that
//! backend crates implement: [`Store`] and [`Queue`] for the shared key/value
//! store, [`LinkSource`] for the upstream link provider, and [`ProgressSink`]
//! for advisory search progress.
//!
//! Raw adapter traits operate on opaque [`Bytes`](bytes::Bytes); the JSON
//! codec lives in the [`JsonStore`] and [`JsonQueue`] extension traits so
//! that backends never deal with typed values.

#![warn(missing_docs)]

pub mod error;
pub mod keys;
pub mod model;
pub mod progress;
pub mod queue;
pub mod source;
pub mod store;

pub use error::{Error, Result, StoreError, StoreResult};
pub use model::{
    Algorithm, ExploreRequest, ExploreResult, PathResult, SearchOutcome, SearchProgress,
    SearchRequest, TaskError, TaskProgress, TaskRecord, TaskStatus,
};
pub use progress::{NoopProgress, ProgressSink};
pub use queue::{JsonQueue, Queue};
pub use source::LinkSource;
pub use store::{DeleteStatus, JsonStore, Store};
