//! Process-wide service wiring.

use std::sync::Arc;

use wikihop_core::{LinkSource, Queue, Result, Store, StoreError};
use wikihop_redis::RedisStore;
use wikihop_wiki::WikiClient;

use crate::config::Config;
use crate::service::{CacheAdmin, ExploreService};
use crate::tasks::TaskRuntime;

/// The shared handles one process runs on: store, queue, upstream client,
/// and the task runtime built over them.
///
/// Built once at startup and cloned wherever needed (all fields are `Arc`s);
/// there is no ambient global state. Tests construct it over the in-memory
/// backend and a scripted link source via [`with_parts`](Self::with_parts).
#[derive(Clone)]
pub struct Services {
    config: Config,
    store: Arc<dyn Store>,
    queue: Arc<dyn Queue>,
    source: Arc<dyn LinkSource>,
    runtime: TaskRuntime,
}

impl Services {
    /// Connects the production backends: one Redis connection manager for
    /// store, queues, and broker, and one HTTP client for the upstream.
    pub fn connect(config: Config) -> Result<Self> {
        let redis = RedisStore::builder()
            .server(&config.redis_url)
            .build()
            .map_err(StoreError::from)?;
        let store: Arc<dyn Store> = Arc::new(redis.clone());
        let queue: Arc<dyn Queue> = Arc::new(redis);

        let source: Arc<dyn LinkSource> = Arc::new(
            WikiClient::builder()
                .api_url(&config.wikipedia_api_url)
                .timeout(config.wikipedia_timeout())
                .batch_size(config.wikipedia_batch_size)
                .max_in_flight(config.wikipedia_max_workers)
                .cache(store.clone(), config.link_cache_ttl())
                .build()?,
        );

        Ok(Self::with_parts(config, store, queue, source))
    }

    /// Wires the services over explicit adapter handles.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn Store>,
        queue: Arc<dyn Queue>,
        source: Arc<dyn LinkSource>,
    ) -> Self {
        let runtime = TaskRuntime::new(
            store.clone(),
            queue.clone(),
            source.clone(),
            config.clone(),
        );
        Self {
            config,
            store,
            queue,
            source,
            runtime,
        }
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared key/value store.
    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    /// The shared queue handle.
    pub fn queue(&self) -> Arc<dyn Queue> {
        self.queue.clone()
    }

    /// The upstream link source.
    pub fn source(&self) -> Arc<dyn LinkSource> {
        self.source.clone()
    }

    /// The background task runtime.
    pub fn runtime(&self) -> &TaskRuntime {
        &self.runtime
    }

    /// A fresh explore service over the shared handles.
    pub fn explore_service(&self) -> ExploreService {
        ExploreService::new(self.source.clone(), self.store.clone())
    }

    /// A fresh cache admin facade.
    pub fn cache_admin(&self) -> CacheAdmin {
        CacheAdmin::new(self.store.clone())
    }

    /// Starts the background workers and housekeeping.
    pub fn start(&self) {
        self.runtime.start();
    }

    /// Stops background work. The Redis connection closes when the last
    /// handle drops.
    pub fn shutdown(&self) {
        self.runtime.shutdown();
    }
}
