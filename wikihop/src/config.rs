//! Environment-driven configuration.

use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use wikihop_core::{Error, Result};

/// Environment variables the service recognizes. Field names match these
/// case-insensitively, which is how figment maps them.
const ENV_KEYS: &[&str] = &[
    "REDIS_URL",
    "WIKIPEDIA_API_URL",
    "WIKIPEDIA_API_TIMEOUT",
    "WIKIPEDIA_BATCH_SIZE",
    "WIKIPEDIA_MAX_WORKERS",
    "CACHE_TTL",
    "MAX_SEARCH_DEPTH",
    "BFS_BATCH_SIZE",
    "TASK_SOFT_TIME_LIMIT",
    "TASK_TIME_LIMIT",
    "TASK_MAX_RETRIES",
    "TASK_RETRY_BACKOFF",
    "WORKER_COUNT",
    "BIND_ADDR",
    "LOG_LEVEL",
];

/// Service configuration, loaded from the environment over built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Redis endpoint for the shared store, queues, and task broker.
    pub redis_url: String,
    /// MediaWiki API endpoint.
    pub wikipedia_api_url: String,
    /// Per-request timeout for upstream calls, in seconds.
    pub wikipedia_api_timeout: u64,
    /// Titles per upstream API call (the API hard limit is 50).
    pub wikipedia_batch_size: usize,
    /// Concurrent upstream sub-batches per lookup.
    pub wikipedia_max_workers: usize,
    /// Link cache TTL, in seconds.
    pub cache_ttl: u64,
    /// Depth bound for the BFS engine.
    pub max_search_depth: u32,
    /// Frontier items pushed per queue round-trip.
    pub bfs_batch_size: usize,
    /// Soft per-attempt limit, in seconds; the search is asked to stop.
    pub task_soft_time_limit: u64,
    /// Hard per-attempt limit, in seconds; the attempt is aborted.
    pub task_time_limit: u64,
    /// Retries after the first failed attempt.
    pub task_max_retries: u32,
    /// Fixed delay between attempts, in seconds.
    pub task_retry_backoff: u64,
    /// Background search workers per process.
    pub worker_count: usize,
    /// HTTP listen address.
    pub bind_addr: String,
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379/0".to_owned(),
            wikipedia_api_url: "https://en.wikipedia.org/w/api.php".to_owned(),
            wikipedia_api_timeout: 15,
            wikipedia_batch_size: 50,
            wikipedia_max_workers: 10,
            cache_ttl: 86_400,
            max_search_depth: 6,
            bfs_batch_size: 50,
            task_soft_time_limit: 300,
            task_time_limit: 600,
            task_max_retries: 3,
            task_retry_backoff: 60,
            worker_count: 2,
            bind_addr: "0.0.0.0:8000".to_owned(),
            log_level: "info".to_owned(),
        }
    }
}

impl Config {
    /// Loads configuration from the environment over the defaults and
    /// validates it.
    pub fn from_env() -> Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
            .map_err(|err| Error::Internal(format!("configuration error: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
            errors.push("REDIS_URL must be a redis:// or rediss:// URL");
        }
        if self.wikipedia_api_timeout == 0 {
            errors.push("WIKIPEDIA_API_TIMEOUT must be positive");
        }
        if self.wikipedia_batch_size == 0 || self.wikipedia_batch_size > 50 {
            errors.push("WIKIPEDIA_BATCH_SIZE must be within 1..=50");
        }
        if self.wikipedia_max_workers == 0 {
            errors.push("WIKIPEDIA_MAX_WORKERS must be positive");
        }
        if self.max_search_depth == 0 {
            errors.push("MAX_SEARCH_DEPTH must be positive");
        }
        if self.bfs_batch_size == 0 {
            errors.push("BFS_BATCH_SIZE must be positive");
        }
        if self.task_time_limit < self.task_soft_time_limit {
            errors.push("TASK_TIME_LIMIT must not be below TASK_SOFT_TIME_LIMIT");
        }
        if self.worker_count == 0 {
            errors.push("WORKER_COUNT must be positive");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Internal(format!(
                "configuration validation failed: {}",
                errors.join(", ")
            )))
        }
    }

    /// Upstream request timeout as a [`Duration`].
    pub fn wikipedia_timeout(&self) -> Duration {
        Duration::from_secs(self.wikipedia_api_timeout)
    }

    /// Link cache TTL as a [`Duration`].
    pub fn link_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Soft per-attempt limit as a [`Duration`].
    pub fn soft_time_limit(&self) -> Duration {
        Duration::from_secs(self.task_soft_time_limit)
    }

    /// Hard per-attempt limit as a [`Duration`].
    pub fn hard_time_limit(&self) -> Duration {
        Duration::from_secs(self.task_time_limit)
    }

    /// Delay between attempts as a [`Duration`].
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.task_retry_backoff)
    }
}
