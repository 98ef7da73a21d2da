//! Two-tier cache: an in-process LRU in front of a durable, compressed store.
//!
//! The durable tier is connected once at startup. If every attempt fails the
//! tier runs memory-only for the rest of the process lifetime; no further
//! reconnects are tried. Durable-store errors after startup degrade the
//! affected call to a miss (or an L1-only set) and are never surfaced.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use super::compression::Compressor;
use super::memory::MemoryTier;
use super::models::{
    CacheEntry, CacheSource, CacheStats, EntryInfo, EntryMetadata, Invalidation, SetOptions,
};
use super::store::{DurableStore, EntryFilter, StoreConnector};
use crate::config::CacheConfig;
use crate::error::{Result, StatsError};
use crate::utils::retry::with_fixed_retry;
use chrono::Utc;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Version stamped into entry metadata; bump when the cached shapes change.
pub const ENTRY_VERSION: u32 = 1;

#[derive(Default)]
struct Counters {
    memory_hits: AtomicU64,
    durable_hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    rejected: AtomicU64,
}

/// Process-wide cache, constructed once and shared behind an `Arc`.
pub struct CacheTier {
    config: CacheConfig,
    memory: MemoryTier,
    durable: Option<Arc<dyn DurableStore>>,
    compressor: Arc<dyn Compressor>,
    degraded: bool,
    counters: Counters,
}

impl CacheTier {
    /// Memory-only cache; used when the durable tier is disabled.
    pub fn memory_only(config: &CacheConfig, compressor: Arc<dyn Compressor>) -> Self {
        Self::build(config, None, compressor, false)
    }

    /// Cache backed by an already connected durable store.
    pub fn with_store(
        config: &CacheConfig,
        store: Arc<dyn DurableStore>,
        compressor: Arc<dyn Compressor>,
    ) -> Self {
        Self::build(config, Some(store), compressor, false)
    }

    /// Connect the durable tier with bounded retries.
    ///
    /// Never fails: once `connect_attempts` are exhausted the cache logs the
    /// degraded mode once and serves from memory only.
    pub async fn connect(
        config: &CacheConfig,
        connector: &dyn StoreConnector,
        compressor: Arc<dyn Compressor>,
    ) -> Self {
        if !config.durable_enabled {
            info!("Durable cache disabled; using in-process cache only");
            return Self::memory_only(config, compressor);
        }

        let target = connector.describe();
        let result = with_fixed_retry(
            "Durable cache connection",
            config.connect_attempts,
            Duration::from_millis(config.connect_backoff_ms),
            move || connector.connect(),
        )
        .await;

        match result {
            Ok(store) => {
                info!("Durable cache connected ({})", target);
                Self::build(config, Some(store), compressor, false)
            }
            Err(e) => {
                warn!(
                    "Durable cache {} unreachable after {} attempts ({}); continuing with in-process cache only",
                    target, config.connect_attempts, e
                );
                Self::build(config, None, compressor, true)
            }
        }
    }

    fn build(
        config: &CacheConfig,
        durable: Option<Arc<dyn DurableStore>>,
        compressor: Arc<dyn Compressor>,
        degraded: bool,
    ) -> Self {
        Self {
            memory: MemoryTier::new(
                config.memory_max_entries,
                Duration::from_secs(config.memory_ttl_seconds),
            ),
            config: config.clone(),
            durable,
            compressor,
            degraded,
            counters: Counters::default(),
        }
    }

    /// True when the durable tier was configured but could not be reached.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn has_durable_tier(&self) -> bool {
        self.durable.is_some()
    }

    pub fn durable_backend(&self) -> Option<&'static str> {
        self.durable.as_ref().map(|store| store.backend())
    }

    /// Look up `key`, checking memory first, then the durable store.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<(T, CacheSource)> {
        if let Some(bytes) = self.memory.get(key) {
            match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
                    crate::metrics::record_cache_hit("memory");
                    debug!("Cache hit (memory): {}", key);
                    return Some((value, CacheSource::Memory));
                }
                Err(e) => {
                    warn!("Dropping undecodable memory entry {}: {}", key, e);
                    self.memory.remove(key);
                }
            }
        }

        if let Some(value) = self.get_durable(key).await {
            self.counters.durable_hits.fetch_add(1, Ordering::Relaxed);
            crate::metrics::record_cache_hit("durable");
            debug!("Cache hit (durable): {}", key);
            return Some((value, CacheSource::Durable));
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        crate::metrics::record_cache_miss();
        debug!("Cache miss: {}", key);
        None
    }

    async fn get_durable<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.durable.as_ref()?;

        let entry = match store.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!("Durable cache read failed for {}: {}", key, e);
                return None;
            }
        };

        let now = Utc::now();
        if entry.is_expired_at(now) {
            debug!("Durable entry expired before sweep, deleting: {}", key);
            self.delete_durable_key(store.as_ref(), key).await;
            return None;
        }

        let bytes = match self.decode_payload(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Dropping unreadable durable entry {}: {}", key, e);
                self.delete_durable_key(store.as_ref(), key).await;
                return None;
            }
        };

        let value: T = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!("Durable entry {} does not match the requested type: {}", key, e);
                return None;
            }
        };

        if let Err(e) = store.touch(key, now).await {
            debug!("Failed to record access for {}: {}", key, e);
        }

        let remaining = (entry.expires_at - now).to_std().unwrap_or_default();
        self.memory.insert(key, Arc::new(bytes), remaining, &entry.tags);

        Some(value)
    }

    fn decode_payload(&self, entry: &CacheEntry) -> Result<Vec<u8>> {
        if entry.is_compressed {
            self.compressor.decompress(&entry.payload)
        } else {
            Ok(entry.payload.clone())
        }
    }

    async fn delete_durable_key(&self, store: &dyn DurableStore, key: &str) {
        if let Err(e) = store.delete_many(EntryFilter::Key(key.to_string())).await {
            debug!("Failed to delete {}: {}", key, e);
        }
    }

    /// Store `value` in both tiers.
    ///
    /// Returns false (and stores nothing) when the serialized payload exceeds
    /// `max_entry_bytes`, the TTL is zero, or serialization fails. A durable
    /// write failure is logged; the value stays cached in memory.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, options: SetOptions) -> bool {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to serialize cache value for {}: {}", key, e);
                return false;
            }
        };

        let size = bytes.len();
        if size > self.config.max_entry_bytes {
            let err = StatsError::PayloadTooLarge {
                size,
                limit: self.config.max_entry_bytes,
            };
            warn!("Not caching {}: {}", key, err);
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            crate::metrics::record_cache_reject();
            return false;
        }

        let ttl = options
            .ttl
            .unwrap_or_else(|| Duration::from_secs(self.config.default_ttl_seconds));
        if ttl.is_zero() {
            debug!("Not caching {}: zero TTL", key);
            return false;
        }

        let tags: BTreeSet<String> = options.tags.iter().cloned().collect();
        let bytes = Arc::new(bytes);

        self.memory.insert(key, Arc::clone(&bytes), ttl, &tags);
        crate::metrics::record_cache_set("memory");

        if let Some(store) = &self.durable {
            let entry = self.build_entry(key, &bytes, ttl, tags, &options);
            let compressed = entry.is_compressed;
            let stored = entry.stored_bytes();

            match store.put(entry).await {
                Ok(()) => {
                    crate::metrics::record_cache_set("durable");
                    debug!(
                        "Cached {} ({} bytes, stored {} bytes{})",
                        key,
                        size,
                        stored,
                        if compressed { ", compressed" } else { "" }
                    );
                }
                Err(e) => warn!("Durable cache write failed for {}: {}", key, e),
            }
        }

        self.counters.sets.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn build_entry(
        &self,
        key: &str,
        bytes: &[u8],
        ttl: Duration,
        tags: BTreeSet<String>,
        options: &SetOptions,
    ) -> CacheEntry {
        let should_compress = match options.compress {
            Some(forced) => forced,
            None => bytes.len() > self.config.compression_threshold_bytes,
        };

        let (payload, is_compressed) = if should_compress {
            match self.compressor.compress(bytes) {
                Ok(compressed) => (compressed, true),
                Err(e) => {
                    warn!(
                        "{} compression failed for {}, storing raw: {}",
                        self.compressor.name(),
                        key,
                        e
                    );
                    (bytes.to_vec(), false)
                }
            }
        } else {
            (bytes.to_vec(), false)
        };

        let now = Utc::now();
        // Millisecond storage: keep expires_at strictly after created_at.
        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::days(365))
            .max(chrono::Duration::milliseconds(1));

        CacheEntry {
            key: key.to_string(),
            payload,
            is_compressed,
            created_at: now,
            expires_at: now + ttl,
            access_count: 0,
            last_accessed_at: now,
            size_bytes: bytes.len(),
            tags,
            metadata: EntryMetadata {
                subject_id: options.subject_id.clone(),
                kind: options.kind.clone(),
                version: ENTRY_VERSION,
            },
        }
    }

    /// Remove matching entries from both tiers.
    ///
    /// Returns the number of distinct keys removed. Fails only on an invalid
    /// pattern; durable-store errors are logged and the memory result is kept.
    pub async fn invalidate(&self, invalidation: Invalidation) -> Result<usize> {
        let (memory_removed, filter) = match &invalidation {
            Invalidation::Key(key) => {
                let removed = if self.memory.remove(key) {
                    vec![key.clone()]
                } else {
                    Vec::new()
                };
                (removed, EntryFilter::Key(key.clone()))
            }
            Invalidation::Pattern(pattern) => {
                let regex = Regex::new(pattern).map_err(|e| {
                    StatsError::InvalidRequest(format!("Invalid pattern {:?}: {}", pattern, e))
                })?;
                (self.memory.remove_matching(&regex), EntryFilter::Pattern(regex))
            }
            Invalidation::Tag(tag) => (self.memory.remove_tagged(tag), EntryFilter::Tag(tag.clone())),
        };

        let mut removed: BTreeSet<String> = memory_removed.into_iter().collect();

        if let Some(store) = &self.durable {
            match store.delete_many(filter).await {
                Ok(keys) => removed.extend(keys),
                Err(e) => warn!("Durable invalidation {:?} failed: {}", invalidation, e),
            }
        }

        info!("Invalidated {} cache entries ({:?})", removed.len(), invalidation);
        Ok(removed.len())
    }

    /// Durable entry metadata without counting an access.
    pub async fn peek(&self, key: &str) -> Option<EntryInfo> {
        let store = self.durable.as_ref()?;
        match store.get(key).await {
            Ok(entry) => entry.map(|e| e.info()),
            Err(e) => {
                warn!("Durable cache peek failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Remove expired entries from both tiers; returns the total removed.
    pub async fn sweep_expired(&self) -> usize {
        let memory_removed = self.memory.purge_expired();
        crate::metrics::record_cache_evictions("memory", memory_removed);

        let durable_removed = match &self.durable {
            Some(store) => match store.delete_many(EntryFilter::ExpiredAt(Utc::now())).await {
                Ok(keys) => keys.len(),
                Err(e) => {
                    warn!("Durable cache sweep failed: {}", e);
                    0
                }
            },
            None => 0,
        };
        crate::metrics::record_cache_evictions("durable", durable_removed);

        if memory_removed + durable_removed > 0 {
            debug!(
                "Cache sweep removed {} memory and {} durable entries",
                memory_removed, durable_removed
            );
        }
        memory_removed + durable_removed
    }

    /// Drop every entry in both tiers; returns the number of distinct keys removed.
    pub async fn clear(&self) -> usize {
        let mut removed: BTreeSet<String> = self.memory.clear().into_iter().collect();

        if let Some(store) = &self.durable {
            match store.delete_many(EntryFilter::All).await {
                Ok(keys) => removed.extend(keys),
                Err(e) => warn!("Durable cache clear failed: {}", e),
            }
        }

        debug!("Cache cleared ({} keys)", removed.len());
        removed.len()
    }

    /// Current statistics, recomputed from counters and the durable store.
    pub async fn stats(&self) -> CacheStats {
        let memory_hits = self.counters.memory_hits.load(Ordering::Relaxed);
        let durable_hits = self.counters.durable_hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let hits = memory_hits + durable_hits;
        let lookups = hits + misses;

        let summary = match &self.durable {
            Some(store) => store.summary().await.unwrap_or_else(|e| {
                warn!("Durable cache summary failed: {}", e);
                Default::default()
            }),
            None => Default::default(),
        };

        let memory_entries = self.memory.len() as u64;
        crate::metrics::update_cache_entries("memory", memory_entries);
        crate::metrics::update_cache_entries("durable", summary.entries);

        CacheStats {
            hits,
            memory_hits,
            durable_hits,
            misses,
            sets: self.counters.sets.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
            memory_entries,
            durable_entries: summary.entries,
            stored_bytes: summary.stored_bytes,
            average_compression_ratio: if summary.compressed_entries == 0 {
                1.0
            } else {
                summary.average_compression_ratio
            },
            degraded: self.degraded,
        }
    }
}
