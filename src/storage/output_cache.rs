//! Output cache for input resolution
//!
//! Holds recently created outputs so spending inputs can be resolved without
//! another `getrawtransaction` round trip:
//! - LRU eviction bounded by entry count
//! - Entries are taken on use, since an output is spent at most once
//! - Hit/miss statistics

use crate::core::TxOut;
use std::collections::{HashMap, VecDeque};

// =============================================================================
// Constants
// =============================================================================

/// Default maximum cache entries
pub const DEFAULT_CACHE_SIZE: usize = 100_000;

// =============================================================================
// Output Cache
// =============================================================================

/// Outpoint-keyed output cache with LRU eviction
#[derive(Debug)]
pub struct OutputCache {
    /// Cached outputs by outpoint (tx_id:output_index), with their insertion stamp
    entries: HashMap<String, (TxOut, u64)>,
    /// Insertion order (front = oldest); stale stamps are skipped on eviction
    lru_order: VecDeque<(String, u64)>,
    /// Maximum cache size, 0 disables caching
    max_size: usize,
    next_stamp: u64,
    stats: CacheStats,
}

impl OutputCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_SIZE)
    }

    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(max_size.min(DEFAULT_CACHE_SIZE)),
            lru_order: VecDeque::new(),
            max_size,
            next_stamp: 0,
            stats: CacheStats::default(),
        }
    }

    /// Remove and return a cached output
    pub fn take(&mut self, tx_id: &str, output_index: u32) -> Option<TxOut> {
        let result = self
            .entries
            .remove(&outpoint_key(tx_id, output_index))
            .map(|(out, _)| out);

        if result.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        result
    }

    /// Insert an output
    pub fn insert(&mut self, tx_id: &str, output_index: u32, output: TxOut) {
        if self.max_size == 0 {
            return;
        }

        while self.entries.len() >= self.max_size {
            if !self.evict_one() {
                break;
            }
        }

        let key = outpoint_key(tx_id, output_index);
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        self.entries.insert(key.clone(), (output, stamp));
        self.lru_order.push_back((key, stamp));
        self.stats.inserts += 1;

        if self.lru_order.len() > self.max_size.saturating_mul(2) {
            self.compact();
        }
    }

    /// Check if an outpoint is cached
    pub fn contains(&self, tx_id: &str, output_index: u32) -> bool {
        self.entries.contains_key(&outpoint_key(tx_id, output_index))
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get cache size
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Private helper methods

    fn evict_one(&mut self) -> bool {
        while let Some((key, stamp)) = self.lru_order.pop_front() {
            let live = matches!(self.entries.get(&key), Some((_, s)) if *s == stamp);
            if live {
                self.entries.remove(&key);
                self.stats.evictions += 1;
                return true;
            }
        }
        false
    }

    /// Drop order records whose entry was taken or replaced
    fn compact(&mut self) {
        let entries = &self.entries;
        self.lru_order
            .retain(|(key, stamp)| matches!(entries.get(key), Some((_, s)) if s == stamp));
    }
}

impl Default for OutputCache {
    fn default() -> Self {
        Self::new()
    }
}

fn outpoint_key(tx_id: &str, output_index: u32) -> String {
    format!("{}:{}", tx_id, output_index)
}

// =============================================================================
// Cache Statistics
// =============================================================================

/// Cache performance statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;

    fn out(amount: u64, recipient: &str) -> TxOut {
        TxOut {
            address: Address::new(recipient),
            amount,
        }
    }

    #[test]
    fn test_cache_insert_take() {
        let mut cache = OutputCache::new();

        cache.insert("tx1", 0, out(100, "addr1"));
        assert!(cache.contains("tx1", 0));

        let result = cache.take("tx1", 0);
        assert_eq!(result.unwrap().amount, 100);
        assert!(!cache.contains("tx1", 0));
        assert!(cache.take("tx1", 0).is_none());

        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_cache_eviction_drops_oldest() {
        let mut cache = OutputCache::with_capacity(3);

        cache.insert("tx1", 0, out(1, "a"));
        cache.insert("tx2", 0, out(2, "a"));
        cache.insert("tx3", 0, out(3, "a"));
        cache.insert("tx4", 0, out(4, "a"));

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 1);
        assert!(!cache.contains("tx1", 0));
        assert!(cache.contains("tx4", 0));
    }

    #[test]
    fn test_taken_entries_are_not_evicted_twice() {
        let mut cache = OutputCache::with_capacity(2);

        cache.insert("tx1", 0, out(1, "a"));
        cache.insert("tx2", 0, out(2, "a"));
        cache.take("tx1", 0);
        cache.insert("tx3", 0, out(3, "a"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        assert!(cache.contains("tx2", 0));
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let mut cache = OutputCache::with_capacity(0);
        cache.insert("tx1", 0, out(1, "a"));
        assert!(cache.is_empty());
        assert!(cache.take("tx1", 0).is_none());
    }

    #[test]
    fn test_order_queue_stays_bounded() {
        let mut cache = OutputCache::with_capacity(4);
        for i in 0..100u32 {
            cache.insert("tx", i, out(i as u64, "a"));
            cache.take("tx", i);
        }
        assert!(cache.lru_order.len() <= 8);
        assert!(cache.is_empty());
    }
}
