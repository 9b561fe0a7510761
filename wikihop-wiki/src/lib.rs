//! MediaWiki link client.
//!
//! [`WikiClient`] resolves page titles to their outgoing article links using
//! the MediaWiki `action=query&prop=links` API, with three layers between a
//! caller and the wire:
//!
//! - a write-through cache at `wiki_links:{title}` in the shared store,
//! - sub-batching of cache misses into API-sized groups (50 titles), and
//! - a bounded concurrent fan-out over the sub-batches.
//!
//! Redirected and normalized titles are mapped back to the spelling the
//! caller asked with, and namespace links (`Category:`, `File:`, ...) are
//! filtered out of every link list, keeping `List of ...` articles.

#![warn(missing_docs)]

mod client;
mod parse;

pub use client::{WikiClient, WikiClientBuilder};
