//! Cache Store Module
//!
//! Generic memoizing key-value store with a per-instance validity duration.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::cache::entry::expiry_from_now;
use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats};

// == KV Cache ==
/// Thread-safe key-value cache where every entry shares the same validity.
///
/// Reads take a shared lock, writes take an exclusive one. A validity of
/// zero means entries never expire; they are then only replaced through
/// [`set`](Self::set) or [`replace_all`](Self::replace_all).
#[derive(Debug)]
pub struct KvCache<K, V> {
    /// Key-value storage
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    /// Validity applied to every write, zero = never expire
    validity: Duration,
    /// Lookup statistics
    stats: StatsCounters,
}

impl<K, V> KvCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty cache whose entries stay valid for `validity`.
    pub fn new(validity: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            validity,
            stats: StatsCounters::default(),
        }
    }

    /// Returns the configured validity duration.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    // == Set ==
    /// Inserts or overwrites a value, resetting its expiry.
    pub fn set(&self, key: K, value: V) {
        let entry = CacheEntry::new(value, self.validity);
        self.write().insert(key, entry);
    }

    // == Get ==
    /// Returns a clone of the value if present and not expired.
    ///
    /// Expired entries are reported as misses but left in place until the
    /// next write over them or [`purge_expired`](Self::purge_expired).
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.read();
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Replace All ==
    /// Atomically swaps the whole key space for `entries`.
    ///
    /// Every new entry shares one freshly computed expiry. Keys not present
    /// in `entries` are gone once this returns.
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let expires_at = expiry_from_now(self.validity);
        let fresh: HashMap<K, CacheEntry<V>> = entries
            .into_iter()
            .map(|(k, v)| (k, CacheEntry::with_expiry(v, expires_at)))
            .collect();

        *self.write() = fresh;
    }

    // == Purge Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A writer panicking mid-insert cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread::{self, sleep};
    use uuid::Uuid;

    #[test]
    fn test_cache_new() {
        let cache: KvCache<String, u32> = KvCache::new(Duration::from_secs(60));
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_set_and_get() {
        let cache = KvCache::new(Duration::from_secs(30 * 60));
        let id = Uuid::new_v4();

        cache.set("a@x.com".to_string(), id);

        assert_eq!(cache.get(&"a@x.com".to_string()), Some(id));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_get_missing_key() {
        let cache: KvCache<String, u32> = KvCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(&"nonexistent".to_string()), None);
    }

    #[test]
    fn test_cache_overwrite() {
        let cache = KvCache::new(Duration::from_secs(60));

        cache.set("key1", "value1");
        cache.set("key1", "value2");

        assert_eq!(cache.get(&"key1"), Some("value2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_ttl_expiration() {
        let cache = KvCache::new(Duration::from_millis(30));

        cache.set("key1", 1);
        assert_eq!(cache.get(&"key1"), Some(1));

        sleep(Duration::from_millis(60));

        assert_eq!(cache.get(&"key1"), None);
        // Lazy expiry keeps the slot until purged
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_set_resets_ttl() {
        let cache = KvCache::new(Duration::from_millis(80));

        cache.set("key1", 1);
        sleep(Duration::from_millis(50));
        cache.set("key1", 2);
        sleep(Duration::from_millis(50));

        assert_eq!(cache.get(&"key1"), Some(2));
    }

    #[test]
    fn test_cache_zero_validity_never_expires() {
        let cache = KvCache::new(Duration::ZERO);
        let user = Uuid::new_v4();
        let chat = Uuid::new_v4();

        cache.set(user, chat);
        sleep(Duration::from_millis(20));

        assert_eq!(cache.get(&user), Some(chat));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[test]
    fn test_cache_replace_all() {
        let cache = KvCache::new(Duration::from_secs(60));

        cache.set("old", 1);
        cache.set("kept", 2);

        cache.replace_all(vec![("kept", 20), ("new", 30)]);

        assert_eq!(cache.get(&"old"), None);
        assert_eq!(cache.get(&"kept"), Some(20));
        assert_eq!(cache.get(&"new"), Some(30));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_replace_all_shares_expiry() {
        let cache = KvCache::new(Duration::from_millis(30));

        cache.replace_all(HashMap::from([("a", 1), ("b", 2)]));
        assert_eq!(cache.get(&"a"), Some(1));

        sleep(Duration::from_millis(60));

        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn test_cache_purge_expired() {
        let cache = KvCache::new(Duration::from_millis(30));

        cache.set("key1", 1);
        sleep(Duration::from_millis(60));

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_stats() {
        let cache = KvCache::new(Duration::from_secs(60));

        cache.set("key1", 1);
        cache.get(&"key1"); // hit
        cache.get(&"nonexistent"); // miss

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_cache_concurrent_readers_and_writers() {
        let cache = Arc::new(KvCache::new(Duration::from_secs(60)));

        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..200u32 {
                        cache.set((t, i), i);
                        assert_eq!(cache.get(&(t, i)), Some(i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 8 * 200);
    }
}
