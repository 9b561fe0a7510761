//! Key/value store traits.
//!
//! Two levels of abstraction, mirroring the split between storage and codec:
//!
//! - [`Store`] - dyn-compatible trait over raw bytes, implemented by backends
//! - [`JsonStore`] - typed JSON operations layered on top (blanket impl)

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::StoreResult;

/// Status of a delete operation.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// The key existed and was removed; the count is the number of keys
    /// deleted (always 1 for single-key deletes).
    Deleted(u64),
    /// The key was not present.
    Missing,
}

/// Low-level key/value storage trait over raw bytes.
///
/// Implementations back the shared cache, the search session namespaces, and
/// the task records. Any backend failure surfaces as
/// [`StoreError::Connection`](crate::StoreError::Connection); callers never
/// see backend-native error types.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads the raw value at `key`. Returns `Ok(None)` on miss.
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Writes `value` at `key`, with an expiry when `ttl` is given.
    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> StoreResult<()>;

    /// Removes `key`.
    async fn delete(&self, key: &str) -> StoreResult<DeleteStatus>;

    /// Whether `key` currently exists.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Deletes every key matching the glob `pattern` and returns the count.
    async fn clear_pattern(&self, pattern: &str) -> StoreResult<u64>;

    /// Remaining time-to-live of `key`, or `None` when the key is missing or
    /// has no expiry.
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    /// Adds `delta` to the integer at `key` (treating a missing key as 0)
    /// and returns the new value.
    async fn increment(&self, key: &str, delta: i64) -> StoreResult<i64>;

    /// Writes `value` only when `key` does not exist. Atomic per key; this
    /// is the primitive for first-visit claims when a search is ever spread
    /// across workers. Returns whether the write happened.
    async fn set_if_absent(&self, key: &str, value: Bytes, ttl: Option<Duration>)
    -> StoreResult<bool>;

    /// Round-trips a no-op command to verify the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;
}

/// Typed JSON operations over any [`Store`].
///
/// The JSON codec lives here, at the adapter boundary: backends only ever
/// see opaque bytes. Automatically implemented for every `Store`, including
/// trait objects.
pub trait JsonStore: Store {
    /// Reads and deserializes the value at `key`.
    fn get_json<T>(&self, key: &str) -> impl Future<Output = StoreResult<Option<T>>> + Send
    where
        T: DeserializeOwned,
    {
        async move {
            match self.get(key).await? {
                Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
                None => Ok(None),
            }
        }
    }

    /// Serializes and writes `value` at `key`.
    fn set_json<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> impl Future<Output = StoreResult<()>> + Send
    where
        T: Serialize + Sync,
    {
        async move {
            let raw = serde_json::to_vec(value)?;
            self.set(key, Bytes::from(raw), ttl).await
        }
    }

    /// Serializes and writes `value` only when `key` does not exist.
    fn set_json_if_absent<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> impl Future<Output = StoreResult<bool>> + Send
    where
        T: Serialize + Sync,
    {
        async move {
            let raw = serde_json::to_vec(value)?;
            self.set_if_absent(key, Bytes::from(raw), ttl).await
        }
    }
}

impl<S> JsonStore for S where S: Store + ?Sized {}
