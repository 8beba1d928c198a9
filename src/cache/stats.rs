//! Cache Statistics Module
//!
//! Tracks memory hits, disk loads, misses and write-through outcomes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups answered from the memory index
    pub hits: u64,
    /// Number of lookups that had to go to disk
    pub misses: u64,
    /// Number of disk lookups that found a stored value
    pub loads: u64,
    /// Number of successful write-through exports
    pub exports: u64,
    /// Number of exports that failed
    pub export_failures: u64,
    /// Number of entry files removed
    pub deletions: u64,
    /// Current number of entries in the memory index
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the memory hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Recorders ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Increments the miss counter, and the load counter when the disk
    /// lookup produced a value.
    pub fn record_miss(&mut self, loaded: bool) {
        self.misses += 1;
        if loaded {
            self.loads += 1;
        }
    }

    /// Records the outcome of one export.
    pub fn record_export(&mut self, ok: bool) {
        if ok {
            self.exports += 1;
        } else {
            self.export_failures += 1;
        }
    }

    /// Increments the deletion counter.
    pub fn record_deletion(&mut self) {
        self.deletions += 1;
    }

    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
