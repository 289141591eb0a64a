use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

/// Structured key for the process-local TTL cache (spec §4.3). The prefix is
/// the method/namespace; `args` carries the call's arguments joined into a
/// stable string so `purge(prefix)` can match by prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub prefix: &'static str,
    pub args: String,
}

impl CacheKey {
    pub fn new(prefix: &'static str, args: impl Into<String>) -> Self {
        CacheKey { prefix, args: args.into() }
    }
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// Bounded, TTL'd, process-local cache. Not a source of truth: a miss always
/// degrades to the underlying source (spec §4.3). Backed by `dashmap` for
/// lock-free concurrent access, the same crate the teacher depends on for
/// its own sharded maps.
pub struct HotCache {
    entries: DashMap<CacheKey, Entry>,
    capacity: usize,
}

impl HotCache {
    pub fn new(capacity: usize) -> Self {
        HotCache { entries: DashMap::with_capacity(capacity), capacity }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                drop(self.entries.remove(key));
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: CacheKey, value: Value, ttl: Duration) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_one();
        }
        self.entries.insert(key, Entry { value, expires_at: Instant::now() + ttl });
    }

    /// Removes every entry whose key starts with `prefix` (admin
    /// invalidation / explicit refresh, spec §4.3, §4.6).
    pub fn purge(&self, prefix: &str) {
        self.entries.retain(|k, _| k.prefix != prefix);
    }

    /// Removes entries under `prefix` whose `args` contain `needle` (a
    /// wallet address), leaving every other wallet's cached entries intact.
    /// Explicit per-wallet refresh must not evict the whole namespace.
    pub fn purge_matching(&self, prefix: &str, needle: &str) {
        self.entries.retain(|k, _| !(k.prefix == prefix && k.args.contains(needle)));
    }

    /// Time-then-size eviction: first drop anything already expired, then
    /// fall back to evicting an arbitrary entry if still over capacity.
    fn evict_one(&self) {
        let now = Instant::now();
        let expired_key = self
            .entries
            .iter()
            .find(|e| e.expires_at <= now)
            .map(|e| e.key().clone());

        if let Some(key) = expired_key {
            self.entries.remove(&key);
            return;
        }

        if let Some(key) = self.entries.iter().next().map(|e| e.key().clone()) {
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub const TTL_OWNERSHIP: Duration = Duration::from_secs(5 * 60);
pub const TTL_IMMUTABLE: Duration = Duration::from_secs(6 * 60 * 60);
pub const TTL_BALANCE: Duration = Duration::from_secs(5 * 60);
pub const TTL_INDEXER: Duration = Duration::from_secs(5 * 60);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_returns_none_after_ttl() {
        let cache = HotCache::new(10);
        let key = CacheKey::new("ownership", "heroes:0xabc");
        cache.put(key.clone(), json!([1, 2]), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn purge_removes_only_matching_prefix() {
        let cache = HotCache::new(10);
        cache.put(CacheKey::new("ownership", "a"), json!(1), TTL_OWNERSHIP);
        cache.put(CacheKey::new("indexer", "a"), json!(2), TTL_INDEXER);
        cache.purge("ownership");
        assert!(cache.get(&CacheKey::new("ownership", "a")).is_none());
        assert!(cache.get(&CacheKey::new("indexer", "a")).is_some());
    }

    #[test]
    fn purge_matching_leaves_other_wallets_untouched() {
        let cache = HotCache::new(10);
        cache.put(CacheKey::new("portfolio", "0xaaa:polygon"), json!(1), TTL_INDEXER);
        cache.put(CacheKey::new("portfolio", "0xbbb:polygon"), json!(2), TTL_INDEXER);
        cache.purge_matching("portfolio", "0xaaa");
        assert!(cache.get(&CacheKey::new("portfolio", "0xaaa:polygon")).is_none());
        assert!(cache.get(&CacheKey::new("portfolio", "0xbbb:polygon")).is_some());
    }

    #[test]
    fn respects_capacity_bound() {
        let cache = HotCache::new(2);
        cache.put(CacheKey::new("p", "1"), json!(1), TTL_OWNERSHIP);
        cache.put(CacheKey::new("p", "2"), json!(2), TTL_OWNERSHIP);
        cache.put(CacheKey::new("p", "3"), json!(3), TTL_OWNERSHIP);
        assert!(cache.len() <= 2);
    }
}
