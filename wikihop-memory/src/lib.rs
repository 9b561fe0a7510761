//! In-memory store and queue backend.
//!
//! `MemoryStore` implements the same [`Store`](wikihop_core::Store) and
//! [`Queue`](wikihop_core::Queue) contracts as the Redis backend, holding
//! everything in process memory. The test suites run against it, and it is
//! enough for single-node development without a Redis instance.
//!
//! Data is not persisted and not shared across processes; expiration is
//! checked lazily on access.

#![warn(missing_docs)]

mod store;

pub use store::MemoryStore;
