//! DashMap-backed implementation of the store and queue traits.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::time::Instant;
use wikihop_core::{DeleteStatus, Queue, Store, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct Entry {
    data: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(data: Bytes, ttl: Option<Duration>) -> Self {
        Self {
            data,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory store and queue on concurrent hash maps.
///
/// Entries carry an absolute expiry checked lazily on access, so a TTL'd key
/// occupies memory until it is next touched or swept by
/// [`clear_pattern`](Store::clear_pattern). Queues live beside plain entries
/// the same way Redis lists live beside string keys, and pattern clearing
/// covers both.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    queues: DashMap<String, VecDeque<Bytes>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys, counting queues. Test helper.
    pub fn key_count(&self) -> usize {
        let entries = self
            .entries
            .iter()
            .filter(|entry| !entry.value().expired())
            .count();
        let queues = self
            .queues
            .iter()
            .filter(|queue| !queue.value().is_empty())
            .count();
        entries + queues
    }

    /// Live keys matching a glob, for asserting on namespace cleanup.
    pub fn keys_matching(&self, pattern: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().expired() && glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.extend(
            self.queues
                .iter()
                .filter(|queue| !queue.value().is_empty() && glob_match(pattern, queue.key()))
                .map(|queue| queue.key().clone()),
        );
        keys.sort();
        keys
    }

    fn drop_if_expired(&self, key: &str) {
        self.entries.remove_if(key, |_, entry| entry.expired());
    }
}

/// Matches `key` against a glob where `*` stands for any run of characters.
///
/// That is the only wildcard the service uses; full Redis glob syntax is not
/// reproduced here.
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }
    let first = parts[0];
    if !key.starts_with(first) {
        return false;
    }
    let rest = &key[first.len()..];
    let last = parts[parts.len() - 1];
    if !rest.ends_with(last) {
        return false;
    }
    let mut middle = &rest[..rest.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match middle.find(part) {
            Some(idx) => middle = &middle[idx + part.len()..],
            None => return false,
        }
    }
    true
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        self.drop_if_expired(key);
        Ok(self.entries.get(key).map(|entry| entry.data.clone()))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> StoreResult<()> {
        self.entries.insert(key.to_owned(), Entry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<DeleteStatus> {
        match self.entries.remove(key) {
            Some((_, entry)) if !entry.expired() => Ok(DeleteStatus::Deleted(1)),
            _ => Ok(DeleteStatus::Missing),
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.drop_if_expired(key);
        Ok(self.entries.contains_key(key))
    }

    async fn clear_pattern(&self, pattern: &str) -> StoreResult<u64> {
        let mut removed = 0;
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        for key in keys {
            if let Some((_, entry)) = self.entries.remove(&key) {
                if !entry.expired() {
                    removed += 1;
                }
            }
        }
        let queue_keys: Vec<String> = self
            .queues
            .iter()
            .filter(|queue| glob_match(pattern, queue.key()))
            .map(|queue| queue.key().clone())
            .collect();
        for key in queue_keys {
            if let Some((_, queue)) = self.queues.remove(&key) {
                if !queue.is_empty() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        self.drop_if_expired(key);
        Ok(self.entries.get(key).and_then(|entry| {
            entry
                .expires_at
                .map(|at| at.saturating_duration_since(Instant::now()))
        }))
    }

    async fn increment(&self, key: &str, delta: i64) -> StoreResult<i64> {
        self.drop_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::new(Bytes::from_static(b"0"), None));
        let current: i64 =
            serde_json::from_slice(&entry.data).map_err(StoreError::from)?;
        let next = current + delta;
        entry.data = Bytes::from(next.to_string());
        Ok(next)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> StoreResult<bool> {
        self.drop_if_expired(key);
        match self.entries.entry(key.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Entry::new(value, ttl));
                Ok(true)
            }
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl Queue for MemoryStore {
    async fn push(&self, queue: &str, item: Bytes) -> StoreResult<()> {
        self.queues.entry(queue.to_owned()).or_default().push_back(item);
        Ok(())
    }

    async fn push_front(&self, queue: &str, item: Bytes) -> StoreResult<()> {
        self.queues
            .entry(queue.to_owned())
            .or_default()
            .push_front(item);
        Ok(())
    }

    async fn pop(&self, queue: &str) -> StoreResult<Option<Bytes>> {
        Ok(self
            .queues
            .get_mut(queue)
            .and_then(|mut queue| queue.pop_front()))
    }

    async fn push_batch(&self, queue: &str, items: Vec<Bytes>) -> StoreResult<()> {
        // One entry lock for the whole batch keeps it contiguous.
        self.queues.entry(queue.to_owned()).or_default().extend(items);
        Ok(())
    }

    async fn pop_batch(&self, queue: &str, count: usize) -> StoreResult<Vec<Bytes>> {
        match self.queues.get_mut(queue) {
            Some(mut queue) => {
                let take = count.min(queue.len());
                Ok(queue.drain(..take).collect())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn length(&self, queue: &str) -> StoreResult<u64> {
        Ok(self.queues.get(queue).map_or(0, |queue| queue.len() as u64))
    }

    async fn peek(&self, queue: &str, index: usize) -> StoreResult<Option<Bytes>> {
        Ok(self
            .queues
            .get(queue)
            .and_then(|queue| queue.get(index).cloned()))
    }

    async fn clear(&self, queue: &str) -> StoreResult<()> {
        self.queues.remove(queue);
        Ok(())
    }
}
