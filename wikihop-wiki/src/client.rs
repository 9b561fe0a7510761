//! The MediaWiki HTTP client.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};
use wikihop_core::{Error, JsonStore, LinkSource, Result, Store, keys};

use crate::parse::{ApiResponse, ParsedBatch, parse_batch};

const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const DEFAULT_USER_AGENT: &str =
    "wikihop/0.1 (https://github.com/wikihop/wikihop; team@wikihop.dev)";

/// Client for resolving page titles to outgoing article links.
///
/// One instance per process; the underlying [`reqwest::Client`] reuses
/// connections across every lookup. When a cache store is attached, link
/// lists are served from `wiki_links:{title}` first and fetched results are
/// written through on success.
#[derive(Clone)]
pub struct WikiClient {
    http: reqwest::Client,
    api_url: String,
    batch_size: usize,
    max_in_flight: usize,
    cache: Option<Arc<dyn Store>>,
    cache_ttl: Duration,
}

impl WikiClient {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn builder() -> WikiClientBuilder {
        WikiClientBuilder::default()
    }

    /// One sub-batch: a single `action=query&prop=links` call for up to
    /// [`batch_size`](WikiClientBuilder::batch_size) titles.
    async fn fetch_batch(&self, batch: Vec<String>) -> Result<ParsedBatch> {
        let titles = batch.join("|");
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", titles.as_str()),
                ("prop", "links"),
                ("pllimit", "max"),
                ("redirects", "1"),
            ])
            .send()
            .await
            .map_err(|err| Error::Upstream(format!("links request failed: {err}")))?
            .error_for_status()
            .map_err(|err| Error::Upstream(format!("links request failed: {err}")))?;

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|err| Error::Upstream(format!("links response decode failed: {err}")))?;

        Ok(parse_batch(body.query, &batch))
    }
}

#[async_trait]
impl LinkSource for WikiClient {
    async fn links_bulk(&self, titles: &[String]) -> Result<HashMap<String, Vec<String>>> {
        if titles.is_empty() {
            return Ok(HashMap::new());
        }

        let mut results: HashMap<String, Vec<String>> = HashMap::new();
        let mut misses: Vec<String> = Vec::new();
        let mut queued: HashSet<&str> = HashSet::new();

        if let Some(cache) = &self.cache {
            for title in titles {
                if results.contains_key(title) || queued.contains(title.as_str()) {
                    continue;
                }
                match cache
                    .get_json::<Vec<String>>(&keys::wiki_links(title))
                    .await?
                {
                    Some(links) => {
                        results.insert(title.clone(), links);
                    }
                    None => {
                        queued.insert(title.as_str());
                        misses.push(title.clone());
                    }
                }
            }
            debug!(
                hits = results.len(),
                misses = misses.len(),
                "link cache lookup"
            );
        } else {
            for title in titles {
                if queued.insert(title.as_str()) {
                    misses.push(title.clone());
                }
            }
        }

        if misses.is_empty() {
            return Ok(results);
        }

        let batches: Vec<Vec<String>> = misses
            .chunks(self.batch_size)
            .map(<[String]>::to_vec)
            .collect();
        debug!(
            titles = misses.len(),
            batches = batches.len(),
            "fetching links from upstream"
        );

        // Sub-batches run concurrently with bounded fan-out; any failure
        // fails the whole bulk call rather than returning partial results.
        let fetched: Vec<ParsedBatch> =
            stream::iter(batches.into_iter().map(|batch| self.fetch_batch(batch)))
                .buffer_unordered(self.max_in_flight)
                .try_collect()
                .await?;

        for parsed in fetched {
            if let Some(cache) = &self.cache {
                for title in &parsed.cacheable {
                    if let Some(links) = parsed.links.get(title) {
                        cache
                            .set_json(&keys::wiki_links(title), links, Some(self.cache_ttl))
                            .await?;
                    }
                }
            }
            results.extend(parsed.links);
        }

        Ok(results)
    }

    async fn page_exists(&self, title: &str) -> bool {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("redirects", "1"),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(title, %err, "page existence probe failed");
                return false;
            }
        };

        match response.json::<ApiResponse>().await {
            Ok(body) => body
                .query
                .pages
                .values()
                .next()
                .is_some_and(|page| page.missing.is_none()),
            Err(err) => {
                warn!(title, %err, "page existence response decode failed");
                false
            }
        }
    }
}

/// Builder for creating and configuring a [`WikiClient`].
pub struct WikiClientBuilder {
    api_url: String,
    user_agent: String,
    timeout: Duration,
    batch_size: usize,
    max_in_flight: usize,
    cache: Option<Arc<dyn Store>>,
    cache_ttl: Duration,
}

impl Default for WikiClientBuilder {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: Duration::from_secs(15),
            batch_size: 50,
            max_in_flight: 10,
            cache: None,
            cache_ttl: keys::LINK_CACHE_TTL,
        }
    }
}

impl WikiClientBuilder {
    /// Sets the MediaWiki API endpoint. Default:
    /// `https://en.wikipedia.org/w/api.php`.
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the `User-Agent` header identifying the service.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the per-request timeout. Default: 15 s.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of titles per API call. The MediaWiki hard
    /// limit (and the default) is 50.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the number of sub-batches fetched concurrently. Default: 10.
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Attaches the write-through link cache with its TTL.
    pub fn cache(mut self, store: Arc<dyn Store>, ttl: Duration) -> Self {
        self.cache = Some(store);
        self.cache_ttl = ttl;
        self
    }

    /// Builds the [`WikiClient`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] when the HTTP client cannot be
    /// constructed.
    pub fn build(self) -> Result<WikiClient> {
        let http = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .build()
            .map_err(|err| Error::Internal(format!("http client construction failed: {err}")))?;
        Ok(WikiClient {
            http,
            api_url: self.api_url,
            batch_size: self.batch_size,
            max_in_flight: self.max_in_flight,
            cache: self.cache,
            cache_ttl: self.cache_ttl,
        })
    }
}
