//! Cache Statistics Module
//!
//! Tracks lookups, stores and invalidations of the response cache.

use serde::Serialize;

// == Cache Stats ==
/// Response cache counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Requests answered from a live entry
    pub hits: u64,
    /// Requests that ran the wrapped handler
    pub misses: u64,
    /// Entries written after a miss
    pub stores: u64,
    /// Entries removed through tag invalidation
    pub tag_evictions: u64,
    /// Number of global clears
    pub clears: u64,
    /// Entries currently held, including expired ones not yet read
    pub total_entries: usize,
    /// Tags with at least one registered key
    pub total_tags: usize,
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_store(&mut self) {
        self.stores += 1;
    }

    pub fn record_tag_evictions(&mut self, count: usize) {
        self.tag_evictions += count as u64;
    }

    pub fn record_clear(&mut self) {
        self.clears += 1;
    }

    // == Update Sizes ==
    pub fn set_sizes(&mut self, entries: usize, tags: usize) {
        self.total_entries = entries;
        self.total_tags = tags;
    }
}
