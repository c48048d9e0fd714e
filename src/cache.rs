//! An in-memory TTL store for resolved flag values.
//!
//! Reads treat an expired entry as absent; there is no background sweep
//! (lazy eviction). The store is bounded: when an insert pushes it past
//! `max_entries`, expired entries are dropped first and then the least
//! recently used one until the bound holds again.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::context::EvaluationContext;
use crate::flags::FlagValue;

/// A cached resolution. `None` means the backend resolved the flag to
/// absent, which is itself worth remembering.
pub(crate) type CachedValue = Option<FlagValue>;

struct CacheEntry {
    value: CachedValue,
    expires_at: Instant,
    last_accessed: Instant,
}

/// Thread-safe TTL store keyed by the canonical (flag key, context) string.
///
/// Writers and readers go through the same lock; the lock is never held
/// across an await point.
pub(crate) struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl CacheStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        CacheStore {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Outer `None` is a miss; `Some(None)` is a cached resolved-absent flag.
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .expect("thread holding cache lock should not panic");

        match entries.get_mut(key) {
            Some(entry) if now < entry.expires_at => {
                entry.last_accessed = now;
                Some(entry.value.clone())
            }
            _ => None,
        }
    }

    pub fn insert(&self, key: String, value: CachedValue) {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .expect("thread holding cache lock should not panic");

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
                last_accessed: now,
            },
        );

        if entries.len() > self.max_entries {
            Self::evict(&mut entries, self.max_entries, now);
        }
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .expect("thread holding cache lock should not panic")
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("thread holding cache lock should not panic")
            .len()
    }

    fn evict(entries: &mut HashMap<String, CacheEntry>, max: usize, now: Instant) {
        entries.retain(|_, entry| now < entry.expires_at);

        while entries.len() > max {
            let lru = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone());
            match lru {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// Cache key for a (flag key, context) pair. Two structurally equal contexts
/// always produce the same key regardless of construction order.
pub(crate) fn cache_key(flag_key: &str, context: &EvaluationContext) -> String {
    format!("{}|{}", flag_key, context.canonical_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{cache_key, CacheStore};
    use crate::context::EvaluationContext;
    use crate::flags::FlagValue;

    fn store(ttl_ms: u64, max_entries: usize) -> CacheStore {
        CacheStore::new(Duration::from_millis(ttl_ms), max_entries)
    }

    #[test]
    fn insert_then_get() {
        let cache = store(60_000, 16);
        cache.insert("k".to_owned(), Some(FlagValue::Boolean(true)));

        assert_eq!(cache.get("k"), Some(Some(FlagValue::Boolean(true))));
    }

    #[test]
    fn resolved_absent_is_a_hit() {
        let cache = store(60_000, 16);
        cache.insert("k".to_owned(), None);

        assert_eq!(cache.get("k"), Some(None));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = store(20, 16);
        cache.insert("k".to_owned(), Some(FlagValue::Number(1.0)));

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("k"), None);
        // The expired entry lingers until overwritten or cleared.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_the_store() {
        let cache = store(60_000, 16);
        cache.insert("a".to_owned(), Some(FlagValue::Boolean(true)));
        cache.insert("b".to_owned(), Some(FlagValue::Boolean(false)));

        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn evicts_least_recently_used_past_bound() {
        let cache = store(60_000, 2);
        cache.insert("a".to_owned(), Some(FlagValue::Number(1.0)));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("b".to_owned(), Some(FlagValue::Number(2.0)));
        std::thread::sleep(Duration::from_millis(2));

        // Touch "a" so "b" becomes the least recently used entry.
        assert!(cache.get("a").is_some());
        std::thread::sleep(Duration::from_millis(2));

        cache.insert("c".to_owned(), Some(FlagValue::Number(3.0)));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert_eq!(cache.get("b"), None);
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn eviction_prefers_expired_entries() {
        let cache = CacheStore::new(Duration::from_millis(20), 2);
        cache.insert("old".to_owned(), Some(FlagValue::Number(1.0)));
        std::thread::sleep(Duration::from_millis(40));

        cache.insert("x".to_owned(), Some(FlagValue::Number(2.0)));
        cache.insert("y".to_owned(), Some(FlagValue::Number(3.0)));

        assert_eq!(cache.get("old"), None);
        assert!(cache.get("x").is_some());
        assert!(cache.get("y").is_some());
    }

    #[test]
    fn key_includes_flag_and_context() {
        let context = EvaluationContext::new().tenant_id("t1");
        assert_ne!(
            cache_key("a", &context),
            cache_key("b", &context),
        );
        assert_ne!(
            cache_key("a", &context),
            cache_key("a", &EvaluationContext::new()),
        );
    }
}
