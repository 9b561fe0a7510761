//! FIFO work queue traits.
//!
//! Same two-level split as the store: [`Queue`] moves raw bytes, [`JsonQueue`]
//! adds the JSON codec on top.

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::StoreResult;

/// FIFO queue operations on the shared store.
///
/// Guarantees: FIFO order per queue name, and [`push_batch`](Queue::push_batch)
/// is observable as one contiguous block (no interleaving with concurrent
/// single pushes on the same queue).
#[async_trait]
pub trait Queue: Send + Sync {
    /// Appends `item` at the tail.
    async fn push(&self, queue: &str, item: Bytes) -> StoreResult<()>;

    /// Inserts `item` at the head, ahead of everything queued.
    async fn push_front(&self, queue: &str, item: Bytes) -> StoreResult<()>;

    /// Removes and returns the head item, or `None` when the queue is empty.
    async fn pop(&self, queue: &str) -> StoreResult<Option<Bytes>>;

    /// Appends all `items` at the tail as one contiguous block.
    async fn push_batch(&self, queue: &str, items: Vec<Bytes>) -> StoreResult<()>;

    /// Removes and returns up to `count` head items, stopping early when the
    /// queue drains.
    async fn pop_batch(&self, queue: &str, count: usize) -> StoreResult<Vec<Bytes>>;

    /// Number of items currently queued.
    async fn length(&self, queue: &str) -> StoreResult<u64>;

    /// Returns the item at `index` (0 = head) without removing it.
    async fn peek(&self, queue: &str, index: usize) -> StoreResult<Option<Bytes>>;

    /// Removes every item from the queue.
    async fn clear(&self, queue: &str) -> StoreResult<()>;
}

/// Typed JSON operations over any [`Queue`].
pub trait JsonQueue: Queue {
    /// Serializes and appends `item` at the tail.
    fn push_json<T>(&self, queue: &str, item: &T) -> impl Future<Output = StoreResult<()>> + Send
    where
        T: Serialize + Sync,
    {
        async move {
            let raw = serde_json::to_vec(item)?;
            self.push(queue, Bytes::from(raw)).await
        }
    }

    /// Serializes and inserts `item` at the head.
    fn push_front_json<T>(
        &self,
        queue: &str,
        item: &T,
    ) -> impl Future<Output = StoreResult<()>> + Send
    where
        T: Serialize + Sync,
    {
        async move {
            let raw = serde_json::to_vec(item)?;
            self.push_front(queue, Bytes::from(raw)).await
        }
    }

    /// Removes and deserializes the head item.
    fn pop_json<T>(&self, queue: &str) -> impl Future<Output = StoreResult<Option<T>>> + Send
    where
        T: DeserializeOwned,
    {
        async move {
            match self.pop(queue).await? {
                Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
                None => Ok(None),
            }
        }
    }

    /// Serializes and appends all `items` as one contiguous block.
    fn push_batch_json<T>(
        &self,
        queue: &str,
        items: &[T],
    ) -> impl Future<Output = StoreResult<()>> + Send
    where
        T: Serialize + Sync,
    {
        async move {
            let raw = items
                .iter()
                .map(|item| serde_json::to_vec(item).map(Bytes::from))
                .collect::<Result<Vec<_>, _>>()?;
            self.push_batch(queue, raw).await
        }
    }

    /// Removes and deserializes up to `count` head items.
    fn pop_batch_json<T>(
        &self,
        queue: &str,
        count: usize,
    ) -> impl Future<Output = StoreResult<Vec<T>>> + Send
    where
        T: DeserializeOwned,
    {
        async move {
            self.pop_batch(queue, count)
                .await?
                .iter()
                .map(|raw| serde_json::from_slice(raw).map_err(Into::into))
                .collect()
        }
    }

    /// Deserializes the item at `index` without removing it.
    fn peek_json<T>(
        &self,
        queue: &str,
        index: usize,
    ) -> impl Future<Output = StoreResult<Option<T>>> + Send
    where
        T: DeserializeOwned,
    {
        async move {
            match self.peek(queue, index).await? {
                Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
                None => Ok(None),
            }
        }
    }
}

impl<Q> JsonQueue for Q where Q: Queue + ?Sized {}
