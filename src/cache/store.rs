// Durable store contract (L2)
// Author: kelexine (https://github.com/kelexine)

use super::models::{CacheEntry, StoreSummary};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::Arc;

/// Selects entries for `delete_many` and `count`.
#[derive(Debug, Clone)]
pub enum EntryFilter {
    All,
    Key(String),
    Pattern(Regex),
    Tag(String),
    /// Entries whose `expires_at` is at or before the instant.
    ExpiredAt(DateTime<Utc>),
}

impl EntryFilter {
    /// Whether `entry` is selected by this filter.
    pub fn matches(&self, entry: &CacheEntry) -> bool {
        match self {
            EntryFilter::All => true,
            EntryFilter::Key(key) => &entry.key == key,
            EntryFilter::Pattern(pattern) => pattern.is_match(&entry.key),
            EntryFilter::Tag(tag) => entry.tags.contains(tag),
            EntryFilter::ExpiredAt(now) => entry.is_expired_at(*now),
        }
    }
}

/// Key-value-with-metadata store backing the durable tier.
///
/// Any document database or embedded KV store can implement this; TTL is
/// enforced by the cache itself, so native expiry support is optional.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Short backend name, used in logs and health output.
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert or replace the entry stored under `entry.key`.
    async fn put(&self, entry: CacheEntry) -> Result<()>;

    /// Record a read: `access_count += 1`, `last_accessed_at = at`.
    async fn touch(&self, key: &str, at: DateTime<Utc>) -> Result<()>;

    /// Delete every selected entry and return the removed keys.
    async fn delete_many(&self, filter: EntryFilter) -> Result<Vec<String>>;

    async fn count(&self, filter: EntryFilter) -> Result<u64>;

    async fn summary(&self) -> Result<StoreSummary>;
}

/// Establishes the durable store; called with retries at startup.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Human-readable target, used in logs.
    fn describe(&self) -> String;

    async fn connect(&self) -> Result<Arc<dyn DurableStore>>;
}
