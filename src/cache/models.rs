//! Cache entry, options and statistics models.

// Author: kelexine (https://github.com/kelexine)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Which tier (if any) answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Memory,
    Durable,
    Fresh,
}

impl CacheSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheSource::Memory => "memory",
            CacheSource::Durable => "durable",
            CacheSource::Fresh => "fresh",
        }
    }
}

/// Descriptive metadata stored with every durable entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    pub subject_id: Option<String>,
    pub kind: String,
    pub version: u32,
}

/// A durable cache entry.
///
/// `payload` holds compressed bytes iff `is_compressed` is true;
/// `size_bytes` is always the uncompressed size.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Vec<u8>,
    pub is_compressed: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub access_count: u64,
    pub last_accessed_at: DateTime<Utc>,
    pub size_bytes: usize,
    pub tags: BTreeSet<String>,
    pub metadata: EntryMetadata,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Bytes actually held by the store.
    pub fn stored_bytes(&self) -> usize {
        self.payload.len()
    }

    /// Metadata view without the payload.
    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            key: self.key.clone(),
            is_compressed: self.is_compressed,
            created_at: self.created_at,
            expires_at: self.expires_at,
            access_count: self.access_count,
            last_accessed_at: self.last_accessed_at,
            size_bytes: self.size_bytes,
            stored_bytes: self.stored_bytes(),
            tags: self.tags.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Payload-free description of a durable entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub key: String,
    pub is_compressed: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub access_count: u64,
    pub last_accessed_at: DateTime<Utc>,
    pub size_bytes: usize,
    pub stored_bytes: usize,
    pub tags: BTreeSet<String>,
    pub metadata: EntryMetadata,
}

/// Per-call options for `CacheTier::set`.
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Lifetime of the entry; the configured default when `None`.
    pub ttl: Option<Duration>,
    pub tags: Vec<String>,
    pub subject_id: Option<String>,
    pub kind: String,
    /// `None` compresses above the threshold, `Some(false)` never compresses,
    /// `Some(true)` always compresses.
    pub compress: Option<bool>,
}

impl SetOptions {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = Some(compress);
        self
    }
}

/// What to remove in `CacheTier::invalidate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Exact key.
    Key(String),
    /// Regular expression matched against keys.
    Pattern(String),
    /// Every entry carrying the tag.
    Tag(String),
}

/// Aggregate view of the durable tier, as reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub entries: u64,
    pub compressed_entries: u64,
    pub stored_bytes: u64,
    pub original_bytes: u64,
    /// Mean of stored/original over compressed entries (1.0 when none are).
    pub average_compression_ratio: f64,
}

/// Statistics for cache operations, recomputed on every call.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub memory_hits: u64,
    pub durable_hits: u64,
    pub misses: u64,
    pub sets: u64,
    /// Sets refused because the payload exceeded the size ceiling.
    pub rejected: u64,
    pub hit_rate: f64,
    pub memory_entries: u64,
    pub durable_entries: u64,
    pub stored_bytes: u64,
    pub average_compression_ratio: f64,
    /// True when the durable tier could not be reached at startup.
    pub degraded: bool,
}
