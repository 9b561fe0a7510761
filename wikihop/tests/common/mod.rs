//! Shared test doubles: a scripted link source over a deterministic graph.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use wikihop_core::{Error, LinkSource, Result};
use wikihop_memory::MemoryStore;

/// Deterministic `{title -> links}` link source.
///
/// Every title exists unless listed as missing. Optionally fails the first N
/// `links_bulk` calls with an upstream error, and can delay each call to
/// exercise the time limits under paused tokio time.
#[derive(Default)]
pub struct StubLinkSource {
    graph: HashMap<String, Vec<String>>,
    missing: HashSet<String>,
    failures: AtomicU32,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl StubLinkSource {
    pub fn from_graph(edges: &[(&str, &[&str])]) -> Self {
        let graph = edges
            .iter()
            .map(|(page, links)| {
                (
                    (*page).to_owned(),
                    links.iter().map(|link| (*link).to_owned()).collect(),
                )
            })
            .collect();
        Self {
            graph,
            ..Self::default()
        }
    }

    pub fn with_missing(mut self, titles: &[&str]) -> Self {
        self.missing = titles.iter().map(|title| (*title).to_owned()).collect();
        self
    }

    /// Fails the first `count` link lookups with an upstream error.
    pub fn with_failures(self, count: u32) -> Self {
        self.failures.store(count, Ordering::Relaxed);
        self
    }

    /// Delays every link lookup, for timeout tests under paused time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `links_bulk` calls made so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LinkSource for StubLinkSource {
    async fn links_bulk(&self, titles: &[String]) -> Result<HashMap<String, Vec<String>>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self
            .failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| {
                left.checked_sub(1)
            })
            .is_ok()
        {
            return Err(Error::Upstream("scripted upstream failure".to_owned()));
        }
        Ok(titles
            .iter()
            .map(|title| {
                (
                    title.clone(),
                    self.graph.get(title).cloned().unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn page_exists(&self, title: &str) -> bool {
        !self.missing.contains(title)
    }
}

/// A fresh in-memory store shared as both `Store` and `Queue`.
pub fn memory() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}
