//! Redis store and queue backend.
//!
//! `RedisStore` implements both [`Store`](wikihop_core::Store) and
//! [`Queue`](wikihop_core::Queue) on a single multiplexed
//! [`ConnectionManager`](redis::aio::ConnectionManager), so the shared cache,
//! the search session namespaces, and the task broker all ride one
//! connection pool per process.

#![warn(missing_docs)]

mod error;
mod store;

pub use error::Error;
pub use store::{RedisStore, RedisStoreBuilder};
