//! Redis implementation of the store and queue traits.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::{Client, aio::ConnectionManager};
use tokio::sync::OnceCell;
use tracing::{debug, trace};
use wikihop_core::{DeleteStatus, Queue, Store, StoreResult};

use crate::error::Error;

/// How many keys one SCAN step asks Redis for when clearing a pattern.
const SCAN_COUNT: usize = 100;

/// Distributed store and queue backend powered by Redis.
///
/// Uses a multiplexed [`ConnectionManager`] established lazily on first
/// operation, so constructing the backend never blocks and many concurrent
/// callers share one underlying connection. Plain keys are stored as Redis
/// strings with native `EXPIRE` TTLs; queues are Redis lists, which keeps
/// them visible to the same pattern sweeps as everything else.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisStore {
    /// Creates a backend connected to `redis://127.0.0.1/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Redis`] when the URL is invalid. Actual connection
    /// errors occur lazily on first operation.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Creates a new builder for `RedisStore`.
    #[must_use]
    pub fn builder() -> RedisStoreBuilder {
        RedisStoreBuilder::default()
    }

    /// Returns the connection manager, establishing it on first call.
    async fn connection(&self) -> Result<ConnectionManager, Error> {
        trace!("get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| {
                debug!("initialize redis connection manager");
                self.client.get_connection_manager()
            })
            .await?;
        Ok(manager.clone())
    }
}

/// Builder for creating and configuring a [`RedisStore`].
pub struct RedisStoreBuilder {
    connection_info: String,
}

impl Default for RedisStoreBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
        }
    }
}

impl RedisStoreBuilder {
    /// Sets the Redis server connection URL.
    ///
    /// The URL format is
    /// `redis://[<username>][:<password>@]<host>[:<port>][/<database>]`.
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Builds the [`RedisStore`] with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Redis`] when the connection URL is invalid.
    pub fn build(self) -> Result<RedisStore, Error> {
        Ok(RedisStore {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
        })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        let mut con = self.connection().await?;
        let data: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(data.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> StoreResult<()> {
        let mut con = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value.as_ref());
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        cmd.query_async::<()>(&mut con).await.map_err(Error::from)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<DeleteStatus> {
        let mut con = self.connection().await?;
        let deleted: u64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        if deleted > 0 {
            Ok(DeleteStatus::Deleted(deleted))
        } else {
            Ok(DeleteStatus::Missing)
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut con = self.connection().await?;
        let exists: bool = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(exists)
    }

    async fn clear_pattern(&self, pattern: &str) -> StoreResult<u64> {
        let mut con = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut con)
                .await
                .map_err(Error::from)?;
            if !keys.is_empty() {
                let deleted: u64 = redis::cmd("DEL")
                    .arg(&keys)
                    .query_async(&mut con)
                    .await
                    .map_err(Error::from)?;
                removed += deleted;
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        debug!(pattern, removed, "cleared keys by pattern");
        Ok(removed)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let mut con = self.connection().await?;
        // TTL returns -2 for a missing key and -1 when no expiry is set.
        let ttl: i64 = redis::cmd("TTL")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok((ttl > 0).then(|| Duration::from_secs(ttl as u64)))
    }

    async fn increment(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut con = self.connection().await?;
        let value: i64 = redis::cmd("INCRBY")
            .arg(key)
            .arg(delta)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(value)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> StoreResult<bool> {
        let mut con = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value.as_ref()).arg("NX");
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        // SET NX replies OK on success and Nil when the key already exists.
        let reply: Option<String> = cmd.query_async(&mut con).await.map_err(Error::from)?;
        Ok(reply.is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut con = self.connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }
}

#[async_trait]
impl Queue for RedisStore {
    async fn push(&self, queue: &str, item: Bytes) -> StoreResult<()> {
        let mut con = self.connection().await?;
        redis::cmd("RPUSH")
            .arg(queue)
            .arg(item.as_ref())
            .query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn push_front(&self, queue: &str, item: Bytes) -> StoreResult<()> {
        let mut con = self.connection().await?;
        redis::cmd("LPUSH")
            .arg(queue)
            .arg(item.as_ref())
            .query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn pop(&self, queue: &str) -> StoreResult<Option<Bytes>> {
        let mut con = self.connection().await?;
        let item: Option<Vec<u8>> = redis::cmd("LPOP")
            .arg(queue)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(item.map(Bytes::from))
    }

    async fn push_batch(&self, queue: &str, items: Vec<Bytes>) -> StoreResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut con = self.connection().await?;
        // A single RPUSH keeps the batch contiguous.
        let mut cmd = redis::cmd("RPUSH");
        cmd.arg(queue);
        for item in &items {
            cmd.arg(item.as_ref());
        }
        cmd.query_async::<()>(&mut con).await.map_err(Error::from)?;
        Ok(())
    }

    async fn pop_batch(&self, queue: &str, count: usize) -> StoreResult<Vec<Bytes>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut con = self.connection().await?;
        let items: Option<Vec<Vec<u8>>> = redis::cmd("LPOP")
            .arg(queue)
            .arg(count)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(items
            .unwrap_or_default()
            .into_iter()
            .map(Bytes::from)
            .collect())
    }

    async fn length(&self, queue: &str) -> StoreResult<u64> {
        let mut con = self.connection().await?;
        let len: u64 = redis::cmd("LLEN")
            .arg(queue)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(len)
    }

    async fn peek(&self, queue: &str, index: usize) -> StoreResult<Option<Bytes>> {
        let mut con = self.connection().await?;
        let item: Option<Vec<u8>> = redis::cmd("LINDEX")
            .arg(queue)
            .arg(index as i64)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(item.map(Bytes::from))
    }

    async fn clear(&self, queue: &str) -> StoreResult<()> {
        let mut con = self.connection().await?;
        redis::cmd("DEL")
            .arg(queue)
            .query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }
}
