//! Bounded LRU cache
//!
//! Entries live in a slot vector and are threaded into a doubly-linked recency
//! list by index (head = most recently used, tail = least recently used).
//! A hash index maps each key to its slot, so `get` and `set` are O(1).
//!
//! Entries are never removed except by eviction, and eviction only happens when
//! a new key arrives at full capacity. The evicted tail slot is reused for the
//! new entry, so the slot vector never grows past `capacity`.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

struct Node<K, V> {
    key: K,
    value: V,
    accessed_at: Instant,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Inner<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    slots: Vec<Node<K, V>>,
    head: Option<usize>,
    tail: Option<usize>,
    hits: u64,
    misses: u64,
}

/// Point-in-time view of the cache, served by the diagnostics endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheSnapshot {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe LRU cache with hit/miss counters
///
/// Every operation takes the same lock: `get` reorders the recency list, so
/// even reads need exclusive access.
pub struct LruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache holding at most `capacity` entries (0 is treated as 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                capacity,
                index: HashMap::with_capacity(capacity),
                slots: Vec::with_capacity(capacity),
                head: None,
                tail: None,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up a key, promoting it to most recently used on a hit
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        match inner.index.get(key).copied() {
            Some(idx) => {
                inner.hits += 1;
                inner.slots[idx].accessed_at = Instant::now();
                inner.move_to_front(idx);
                Some(inner.slots[idx].value.clone())
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite a key
    ///
    /// Overwriting refreshes recency but never evicts and never touches the
    /// hit/miss counters. Inserting a new key at full capacity evicts the
    /// least recently used entry.
    pub fn set(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        if let Some(idx) = inner.index.get(&key).copied() {
            let node = &mut inner.slots[idx];
            node.value = value;
            node.accessed_at = now;
            inner.move_to_front(idx);
            return;
        }

        if inner.slots.len() < inner.capacity {
            let idx = inner.slots.len();
            inner.slots.push(Node {
                key: key.clone(),
                value,
                accessed_at: now,
                prev: None,
                next: None,
            });
            inner.index.insert(key, idx);
            inner.push_front(idx);
            return;
        }

        // Full: recycle the tail slot for the new key
        let Some(victim) = inner.tail else {
            return;
        };
        inner.unlink(victim);
        let evicted = std::mem::replace(&mut inner.slots[victim].key, key.clone());
        inner.index.remove(&evicted);
        let node = &mut inner.slots[victim];
        node.value = value;
        node.accessed_at = now;
        inner.index.insert(key, victim);
        inner.push_front(victim);
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Cumulative `(hits, misses)` since construction
    pub fn stats(&self) -> (u64, u64) {
        let inner = self.inner.lock();
        (inner.hits, inner.misses)
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let inner = self.inner.lock();
        CacheSnapshot {
            len: inner.index.len(),
            capacity: inner.capacity,
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    /// Keys ordered from most to least recently used (no recency side effect)
    #[cfg(test)]
    pub(crate) fn keys(&self) -> Vec<K> {
        let inner = self.inner.lock();
        let mut keys = Vec::with_capacity(inner.index.len());
        let mut cursor = inner.head;
        while let Some(idx) = cursor {
            keys.push(inner.slots[idx].key.clone());
            cursor = inner.slots[idx].next;
        }
        keys
    }

    /// Last `get`/`set` instant for a key (no recency side effect)
    pub fn last_access(&self, key: &K) -> Option<Instant> {
        let inner = self.inner.lock();
        inner
            .index
            .get(key)
            .map(|&idx| inner.slots[idx].accessed_at)
    }
}

impl<K, V> Inner<K, V> {
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = None;
        self.slots[idx].next = self.head;
        if let Some(old_head) = self.head {
            self.slots[old_head].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_capacity_two_scenario() {
        let cache = LruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.get(&"a"), Some(1));
        cache.set("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["c", "a"]);
        assert_eq!(cache.stats(), (1, 0));

        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
        assert_eq!(cache.stats(), (3, 1));
    }

    #[test]
    fn test_zero_capacity_coerced_to_one() {
        let cache = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);

        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.keys(), vec!["b"]);
    }

    #[test]
    fn test_overwrite_does_not_evict_or_count() {
        let cache = LruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats(), (0, 0));
        assert_eq!(cache.keys(), vec!["a", "b"]);

        // "b" is now the tail and goes first
        cache.set("c", 3);
        assert_eq!(cache.keys(), vec!["c", "a"]);
        assert_eq!(cache.get(&"a"), Some(10));
    }

    #[test]
    fn test_get_promotes_entry() {
        let cache = LruCache::new(3);
        cache.set(1, "one");
        cache.set(2, "two");
        cache.set(3, "three");

        // 1 is the tail until touched
        assert_eq!(cache.get(&1), Some("one"));
        cache.set(4, "four");
        assert_eq!(cache.keys(), vec![4, 1, 3]);

        cache.set(5, "five");
        assert_eq!(cache.keys(), vec![5, 4, 1]);
    }

    #[test]
    fn test_miss_counts_and_empty() {
        let cache: LruCache<String, u32> = LruCache::new(4);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"missing".to_string()), None);
        assert_eq!(cache.get(&"missing".to_string()), None);
        assert_eq!(cache.stats(), (0, 2));
        assert_eq!(
            cache.snapshot(),
            CacheSnapshot {
                len: 0,
                capacity: 4,
                hits: 0,
                misses: 2
            }
        );
    }

    #[test]
    fn test_last_access_refreshed_by_get() {
        let cache = LruCache::new(2);
        cache.set("a", 1);
        let first = cache.last_access(&"a").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        cache.get(&"a");
        let second = cache.last_access(&"a").unwrap();
        assert!(second > first);
        assert!(cache.last_access(&"zzz").is_none());
    }

    #[test]
    fn test_len_never_exceeds_capacity_and_tracks_reference_order() {
        // Compare against a naive Vec-based model over a deterministic op sequence
        let capacity = 5;
        let cache = LruCache::new(capacity);
        let mut model: Vec<u32> = Vec::new(); // MRU first

        let mut seed: u32 = 17;
        for _ in 0..2000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let key = (seed >> 16) % 12;
            if seed % 3 == 0 {
                let hit = cache.get(&key).is_some();
                assert_eq!(hit, model.contains(&key));
                if hit {
                    model.retain(|k| *k != key);
                    model.insert(0, key);
                }
            } else {
                cache.set(key, key * 10);
                model.retain(|k| *k != key);
                model.insert(0, key);
                model.truncate(capacity);
            }
            assert!(cache.len() <= capacity);
            assert_eq!(cache.keys(), model);
        }
    }

    #[test]
    fn test_concurrent_access_is_consistent() {
        let cache = Arc::new(LruCache::new(64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..1000u64 {
                        let key = (i * 7 + t) % 128;
                        cache.set(key, i);
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(cache.len() <= 64);
        let (hits, misses) = cache.stats();
        assert_eq!(hits + misses, 8 * 1000);
        assert_eq!(cache.keys().len(), cache.len());
    }
}
