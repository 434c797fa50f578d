//! Resolution cache.
//!
//! Memoizes resolutions per (entity, catalog generation). Entries of older
//! generations are never served; a reload clears them all.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::catalog::TypeId;
use crate::resolve::Resolution;

/// Cache key: the entity and the generation it was resolved against.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CacheKey {
    /// Entity name.
    pub entity: TypeId,
    /// Catalog generation.
    pub generation: u64,
}

impl CacheKey {
    /// Create a cache key.
    pub fn new(entity: impl Into<TypeId>, generation: u64) -> Self {
        Self {
            entity: entity.into(),
            generation,
        }
    }
}

/// Cached resolution with its hit counter.
#[derive(Debug)]
struct CachedResolution {
    resolution: Arc<Resolution>,
    hit_count: AtomicU64,
}

impl CachedResolution {
    fn new(resolution: Arc<Resolution>) -> Self {
        Self {
            resolution,
            hit_count: AtomicU64::new(0),
        }
    }

    fn record_hit(&self) -> u64 {
        self.hit_count.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    fn hits(&self) -> u64 {
        self.hit_count.load(AtomicOrdering::Relaxed)
    }
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStatsSnapshot {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that had to resolve.
    pub misses: u64,
    /// Entries evicted by the capacity bound.
    pub evictions: u64,
    /// Hit rate, 0.0 to 1.0.
    pub hit_rate: f64,
}

impl CacheStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    /// Get eviction count.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(AtomicOrdering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }

    /// Copy the counters.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            evictions: self.evictions(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Thread-safe memo of resolutions.
pub struct ResolutionCache {
    entries: DashMap<CacheKey, CachedResolution>,
    /// Maximum number of entries. None means unbounded.
    max_entries: Option<usize>,
    /// Generation currently being served.
    current_generation: AtomicU64,
    stats: CacheStats,
}

impl ResolutionCache {
    /// Create a cache for the given generation.
    pub fn new(generation: u64, max_entries: Option<usize>) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            current_generation: AtomicU64::new(generation),
            stats: CacheStats::default(),
        }
    }

    /// Get a cached resolution if it belongs to the current generation.
    pub fn get(&self, entity: &str, generation: u64) -> Option<Arc<Resolution>> {
        if generation == self.current_generation.load(AtomicOrdering::SeqCst) {
            let key = CacheKey::new(entity, generation);
            if let Some(cached) = self.entries.get(&key) {
                let hits = cached.record_hit();
                self.stats.hits.fetch_add(1, AtomicOrdering::Relaxed);
                debug!(entity, generation, hits, "resolution cache hit");
                return Some(cached.resolution.clone());
            }
        }

        self.stats.misses.fetch_add(1, AtomicOrdering::Relaxed);
        debug!(entity, generation, "resolution cache miss");
        None
    }

    /// Insert a resolution and return the value the cache holds for its key.
    ///
    /// When another caller inserted first, its value wins and is returned, so
    /// every caller observes one value per key. Resolutions computed against
    /// an older generation are returned but not cached.
    pub fn insert(&self, resolution: Resolution) -> Arc<Resolution> {
        let generation = resolution.generation;
        let current = self.current_generation.load(AtomicOrdering::SeqCst);
        let resolution = Arc::new(resolution);

        if generation < current {
            debug!(entity = %resolution.entity, generation, current, "not caching stale resolution");
            return resolution;
        }
        if generation > current {
            self.invalidate(generation);
        }

        let key = CacheKey::new(&resolution.entity, generation);
        if let Some(max) = self.max_entries {
            if self.entries.len() >= max && !self.entries.contains_key(&key) {
                self.evict_least_hit();
            }
        }

        let cached = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CachedResolution::new(resolution))
            .resolution
            .clone();

        // A reload may have landed between the generation check and the insert.
        if self.current_generation.load(AtomicOrdering::SeqCst) != generation {
            self.entries.remove(&key);
            debug!(entity = %key.entity, generation, "dropped resolution invalidated during insert");
        }
        cached
    }

    /// Drop every entry and start serving `generation`.
    pub fn invalidate(&self, generation: u64) {
        self.current_generation
            .store(generation, AtomicOrdering::SeqCst);
        self.entries.clear();
    }

    /// Evict the entry with the lowest hit count.
    fn evict_least_hit(&self) {
        let evict_key = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().hits())
            .map(|entry| entry.key().clone());

        if let Some(key) = evict_key {
            if self.entries.remove(&key).is_some() {
                self.stats.evictions.fetch_add(1, AtomicOrdering::Relaxed);
                debug!(entity = %key.entity, generation = key.generation, "evicted resolution");
            }
        }
    }

    /// Generation currently being served.
    pub fn current_generation(&self) -> u64 {
        self.current_generation.load(AtomicOrdering::SeqCst)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get the current number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(entity: &str, generation: u64) -> Resolution {
        Resolution {
            entity: entity.to_string(),
            generation,
            relations: vec![],
            diagnostics: vec![],
        }
    }

    #[test]
    fn test_cache_insert_and_get() {
        let cache = ResolutionCache::new(1, None);
        cache.insert(resolution("Order", 1));

        let cached = cache.get("Order", 1);
        assert!(cached.is_some());
        assert_eq!(cached.unwrap().entity, "Order");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_miss() {
        let cache = ResolutionCache::new(1, None);

        assert!(cache.get("Order", 1).is_none());
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = ResolutionCache::new(1, None);
        let first = cache.insert(resolution("Order", 1));
        let second = cache.insert(resolution("Order", 1));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_generation_invalidation() {
        let cache = ResolutionCache::new(1, None);
        cache.insert(resolution("Order", 1));
        assert!(cache.get("Order", 1).is_some());

        cache.invalidate(2);

        assert!(cache.get("Order", 1).is_none());
        assert!(cache.get("Order", 2).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.current_generation(), 2);
    }

    #[test]
    fn test_stale_resolution_not_cached() {
        let cache = ResolutionCache::new(3, None);
        let stale = cache.insert(resolution("Order", 2));

        assert_eq!(stale.generation, 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reload_during_insert_leaves_no_entry() {
        let cache = ResolutionCache::new(1, Some(4));

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..1000 {
                    cache.insert(resolution("Order", 1));
                }
            });
            cache.invalidate(2);
        });

        // Whatever the interleaving, nothing of generation 1 survives.
        assert!(cache.get("Order", 1).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.current_generation(), 2);
    }

    #[test]
    fn test_newer_generation_advances_cache() {
        let cache = ResolutionCache::new(1, None);
        cache.insert(resolution("Order", 1));
        cache.insert(resolution("Order", 2));

        assert_eq!(cache.current_generation(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("Order", 2).is_some());
    }

    #[test]
    fn test_cache_eviction() {
        let cache = ResolutionCache::new(1, Some(2));
        cache.insert(resolution("Order", 1));
        cache.insert(resolution("OrderItem", 1));

        // Access OrderItem to increase its hit count
        cache.get("OrderItem", 1);
        cache.get("OrderItem", 1);

        // Inserting a third evicts Order (lowest hit count)
        cache.insert(resolution("Customer", 1));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("OrderItem", 1).is_some());
        assert!(cache.get("Customer", 1).is_some());
        assert!(cache.get("Order", 1).is_none());
        assert_eq!(cache.stats().evictions(), 1);
    }

    #[test]
    fn test_cache_stats() {
        let cache = ResolutionCache::new(1, None);

        // Miss
        cache.get("Order", 1);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hits(), 0);

        cache.insert(resolution("Order", 1));
        cache.get("Order", 1);
        cache.get("Order", 1);

        let stats = cache.stats().snapshot();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        // Hit rate = 2 / (2 + 1) = 0.666...
        assert!((stats.hit_rate - 0.666).abs() < 0.01);
    }
}
