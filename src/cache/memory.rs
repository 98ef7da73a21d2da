// In-process cache tier (L1)
// Author: kelexine (https://github.com/kelexine)

use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Arc<Vec<u8>>,
    expires_at: Instant,
    tags: BTreeSet<String>,
}

/// Bounded, short-lived key -> bytes map shared by all requests.
///
/// Entries never outlive `max_ttl`, whatever TTL the caller asked for. The
/// least recently used entry is dropped when the map is full.
pub struct MemoryTier {
    entries: Mutex<LruCache<String, MemoryEntry>>,
    max_ttl: Duration,
}

impl MemoryTier {
    pub fn new(capacity: usize, max_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            max_ttl,
        }
    }

    /// Look up a live entry; an expired one is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(Arc::clone(&entry.value));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            debug!("Memory tier entry expired: {}", key);
        }
        None
    }

    /// Store `value` for `min(ttl, max_ttl)`.
    pub fn insert(&self, key: &str, value: Arc<Vec<u8>>, ttl: Duration, tags: &BTreeSet<String>) {
        let ttl = ttl.min(self.max_ttl);
        if ttl.is_zero() {
            return;
        }

        let entry = MemoryEntry {
            value,
            expires_at: Instant::now() + ttl,
            tags: tags.clone(),
        };
        self.entries.lock().put(key.to_string(), entry);
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Remove every key matching `pattern`; returns the removed keys.
    pub fn remove_matching(&self, pattern: &Regex) -> Vec<String> {
        self.remove_where(|key, _| pattern.is_match(key))
    }

    /// Remove every entry carrying `tag`; returns the removed keys.
    pub fn remove_tagged(&self, tag: &str) -> Vec<String> {
        self.remove_where(|_, entry| entry.tags.contains(tag))
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        self.remove_where(|_, entry| entry.expires_at <= now).len()
    }

    /// Drop everything; returns the removed keys.
    pub fn clear(&self) -> Vec<String> {
        self.remove_where(|_, _| true)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_where<F>(&self, predicate: F) -> Vec<String>
    where
        F: Fn(&str, &MemoryEntry) -> bool,
    {
        let mut entries = self.entries.lock();
        let keys: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| predicate(key, entry))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            entries.pop(key);
        }
        keys
    }
}
