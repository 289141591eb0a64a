mod hot_cache;

pub use hot_cache::{CacheKey, HotCache, TTL_BALANCE, TTL_IMMUTABLE, TTL_INDEXER, TTL_OWNERSHIP};
