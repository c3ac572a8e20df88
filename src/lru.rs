//! A small generic, thread-safe LRU cache.
//!
//! No crate in the example pack provides a general-purpose LRU, so this is
//! hand-rolled over the same primitives the teacher already reaches for
//! (`ahash::AHashMap`, `parking_lot::Mutex`) rather than adding a new
//! dependency for a handful of methods.

use ahash::AHashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::hash::Hash;

/// `spec.md` §4.10: `stats() -> {size, capacity, hits, misses}`. `evictions`
/// is an ambient addition carried alongside, not a spec field.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Inner<K, V> {
    map: AHashMap<K, V>,
    order: VecDeque<K>,
    stats: CacheStats,
}

/// A capacity-bounded cache evicting the least-recently-used entry.
///
/// `capacity <= 0` is normalized to 100, matching the behavior every other
/// bounded-size knob in the teacher's configuration takes for a nonsensical
/// input rather than panicking.
pub struct LruCache<K, V> {
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    pub fn new(capacity: i64) -> Self {
        let capacity = if capacity <= 0 { 100 } else { capacity as usize };
        LruCache {
            capacity,
            inner: Mutex::new(Inner {
                map: AHashMap::new(),
                order: VecDeque::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        if let Some(value) = inner.map.get(key).cloned() {
            inner.stats.hits += 1;
            Self::touch(&mut inner.order, key);
            Some(value)
        } else {
            inner.stats.misses += 1;
            None
        }
    }

    pub fn put(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        if inner.map.contains_key(&key) {
            Self::touch(&mut inner.order, &key);
        } else {
            if inner.map.len() >= self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.map.remove(&oldest);
                    inner.stats.evictions += 1;
                }
            }
            inner.order.push_back(key.clone());
        }
        inner.map.insert(key, value);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.map.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats { size: inner.map.len(), capacity: self.capacity, ..inner.stats }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(order: &mut VecDeque<K>, key: &K) {
        if let Some(pos) = order.iter().position(|k| k == key) {
            if let Some(k) = order.remove(pos) {
                order.push_back(k);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_miss_then_hit() {
        let cache: LruCache<String, i32> = LruCache::new(10);
        assert_eq!(cache.get(&"a".to_string()), None);
        cache.put("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache: LruCache<i32, i32> = LruCache::new(2);
        cache.put(1, 1);
        cache.put(2, 2);
        cache.get(&1); // 1 is now most-recently-used
        cache.put(3, 3); // evicts 2
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(1));
        assert_eq!(cache.get(&3), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn nonpositive_capacity_normalizes_to_100() {
        let cache: LruCache<i32, i32> = LruCache::new(0);
        for i in 0..100 {
            cache.put(i, i);
        }
        assert_eq!(cache.len(), 100);
        cache.put(100, 100);
        assert_eq!(cache.len(), 100);
    }

    #[test]
    fn stats_report_size_and_capacity() {
        let cache: LruCache<i32, i32> = LruCache::new(5);
        cache.put(1, 1);
        cache.put(2, 2);
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.capacity, 5);
    }

    #[test]
    fn clear_empties_cache() {
        let cache: LruCache<i32, i32> = LruCache::new(10);
        cache.put(1, 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
