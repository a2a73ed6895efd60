//! Bounded in-memory cache with time-based freshness.
//!
//! Entries are never deleted when they go stale: freshness is decided by the
//! caller against a TTL, so a stale entry stays available as a fallback until
//! it is pushed out by capacity eviction.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

/// A cached value together with the moment it was stored
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Whether the entry is younger than `ttl` at `now`
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.stored_at < ttl
    }
}

struct Slot<V> {
    entry: CacheEntry<V>,
    // insertion order, breaks ties between equal timestamps
    seq: u64,
}

struct Inner<K, V> {
    slots: HashMap<K, Slot<V>>,
    next_seq: u64,
}

/// Key/value store holding at most `max_entries` entries.
///
/// When an insert pushes the store past capacity, the `evict_count` oldest
/// entries (by `stored_at`, then insertion order) that existed before the
/// insert are removed.
pub struct CacheStore<K, V> {
    inner: RwLock<Inner<K, V>>,
    max_entries: usize,
    evict_count: usize,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new(max_entries: usize, evict_count: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            inner: RwLock::new(Inner {
                slots: HashMap::new(),
                next_seq: 0,
            }),
            max_entries,
            evict_count: evict_count.clamp(1, max_entries),
        }
    }

    /// Returns the entry for `key`, fresh or not
    #[must_use]
    pub fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.slots.get(key).map(|slot| slot.entry.clone())
    }

    /// Stores `value` stamped with the current time
    pub fn set(&self, key: K, value: V) {
        self.set_at(key, value, Utc::now());
    }

    /// Stores `value` stamped with `stored_at`, overwriting any existing entry
    pub fn set_at(&self, key: K, value: V, stored_at: DateTime<Utc>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.slots.insert(
            key.clone(),
            Slot {
                entry: CacheEntry { value, stored_at },
                seq,
            },
        );

        if inner.slots.len() > self.max_entries {
            let mut candidates: Vec<(DateTime<Utc>, u64, K)> = inner
                .slots
                .iter()
                .filter(|(k, _)| **k != key)
                .map(|(k, slot)| (slot.entry.stored_at, slot.seq, k.clone()))
                .collect();
            candidates.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

            let evicted = candidates.len().min(self.evict_count);
            for (_, _, k) in candidates.into_iter().take(evicted) {
                inner.slots.remove(&k);
            }
            debug!(
                evicted,
                remaining = inner.slots.len(),
                "Evicted oldest cache entries"
            );
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_set_then_get() {
        let store = CacheStore::new(10, 2);
        store.set_at("a".to_string(), "doc".to_string(), t(0));

        let entry = store.get(&"a".to_string()).unwrap();
        assert_eq!(entry.value, "doc");
        assert_eq!(entry.stored_at, t(0));
        assert!(store.get(&"b".to_string()).is_none());
    }

    #[test]
    fn test_set_stamps_current_time() {
        let store = CacheStore::new(10, 2);
        let before = Utc::now();
        store.set("a", 1);
        let after = Utc::now();

        let entry = store.get(&"a").unwrap();
        assert!(entry.stored_at >= before && entry.stored_at <= after);
        assert!(entry.is_fresh(after, TimeDelta::hours(3)));
    }

    #[test]
    fn test_stale_entry_is_kept() {
        let ttl = TimeDelta::hours(3);
        let store = CacheStore::new(10, 2);
        store.set_at("a", 1, t(0));

        let entry = store.get(&"a").unwrap();
        assert!(entry.is_fresh(t(0), ttl));
        assert!(entry.is_fresh(t(3 * 3600 - 1), ttl));
        assert!(!entry.is_fresh(t(3 * 3600), ttl));
        assert!(!entry.is_fresh(t(3 * 3600 + 1), ttl));

        // logical expiry never removes the entry
        assert!(store.get(&"a").is_some());
    }

    #[test]
    fn test_overwrite_restamps() {
        let store = CacheStore::new(10, 2);
        store.set_at("a", 1, t(0));
        store.set_at("a", 2, t(50));

        let entry = store.get(&"a").unwrap();
        assert_eq!(entry.value, 2);
        assert_eq!(entry.stored_at, t(50));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_eviction_removes_oldest() {
        let store = CacheStore::new(4, 2);
        // inserted out of timestamp order
        store.set_at("c", 3, t(30));
        store.set_at("a", 1, t(10));
        store.set_at("d", 4, t(40));
        store.set_at("b", 2, t(20));
        assert_eq!(store.len(), 4);

        store.set_at("e", 5, t(50));
        assert_eq!(store.len(), 3);
        assert!(store.get(&"a").is_none());
        assert!(store.get(&"b").is_none());
        assert!(store.get(&"c").is_some());
        assert!(store.get(&"d").is_some());
        assert!(store.get(&"e").is_some());
    }

    #[test]
    fn test_eviction_spares_new_entry() {
        let store = CacheStore::new(2, 1);
        store.set_at("a", 1, t(10));
        store.set_at("b", 2, t(20));
        store.set_at("old", 3, t(0));

        assert!(store.get(&"old").is_some());
        assert!(store.get(&"a").is_none());
        assert!(store.get(&"b").is_some());
    }

    #[test]
    fn test_eviction_ties_follow_insertion_order() {
        let store = CacheStore::new(3, 2);
        store.set_at("first", 1, t(0));
        store.set_at("second", 2, t(0));
        store.set_at("third", 3, t(0));
        store.set_at("fourth", 4, t(0));

        assert!(store.get(&"first").is_none());
        assert!(store.get(&"second").is_none());
        assert!(store.get(&"third").is_some());
        assert!(store.get(&"fourth").is_some());
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let store = CacheStore::new(200, 50);
        for i in 0..1000 {
            store.set_at(i, i, t(i64::from(i)));
            assert!(store.len() <= store.max_entries());
        }
        assert!(store.get(&999).is_some());
    }
}
