//! Cache Store Module
//!
//! Entry map plus tag index. Expiry is checked lazily on lookup; nothing
//! sweeps the map in the background.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStats, TagIndex};

// == Cache Store ==
/// Unbounded response store keyed by derived cache keys.
///
/// Entries leave the map only when a lookup finds them expired, when one of
/// their tags is invalidated, or on a global clear.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Cache key to entry
    entries: HashMap<String, CacheEntry>,
    /// Tag to cache keys
    tags: TagIndex,
    /// Counters
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Lookup ==
    /// Returns the payload for `key` if it is still live at `now`, counting
    /// a hit. An expired entry is removed.
    ///
    /// Absent keys are not counted here: a caller may look up the same key
    /// twice for one request, so it reports the miss with `record_miss`
    /// once it actually recomputes.
    pub fn lookup(&mut self, key: &str, now: Instant) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let payload = entry.payload.clone();
                self.stats.record_hit();
                return Some(payload);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn record_miss(&mut self) {
        self.stats.record_miss();
    }

    // == Store ==
    /// Inserts or overwrites `key`, then registers it under each tag.
    pub fn store<S: AsRef<str>>(
        &mut self,
        key: String,
        payload: String,
        ttl: Duration,
        tags: &[S],
        now: Instant,
    ) {
        self.tags.register(&key, tags);
        self.entries.insert(key, CacheEntry::new(payload, now, ttl));
        self.stats.record_store();
    }

    // == Evict By Tag ==
    /// Removes every entry registered under `tag` and forgets the tag.
    ///
    /// Returns the number of entries removed. Unknown tags remove nothing.
    pub fn evict_by_tag(&mut self, tag: &str) -> usize {
        let removed = self
            .tags
            .take(tag)
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count();
        self.stats.record_tag_evictions(removed);
        removed
    }

    // == Clear All ==
    /// Removes every entry and every tag. Returns the number of entries removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.tags.clear();
        self.stats.record_clear();
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_sizes(self.entries.len(), self.tags.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
