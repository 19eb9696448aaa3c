use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Fixed cache keys, one per list query. Movie details use [`movie_key`].
pub mod keys {
    pub const NOW_PLAYING: &str = "nowPlaying";
    pub const TRENDING: &str = "trending";
    pub const TRAKT_TRENDING: &str = "traktTrending";

    pub fn movie_key(id: i32) -> String {
        format!("movies/{id}")
    }
}

/// One cached aggregation result. Serialized the way the original cache
/// documents looked: the payload under `results`, stamped with `updatedAt`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    #[serde(rename = "results")]
    pub payload: Value,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Best-effort document store for aggregation results. Writes replace the
/// entry wholesale; reads may be arbitrarily stale. Not a source of truth.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<CacheEntry>;
    async fn put(&self, key: &str, payload: Value);
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) => {
                debug!("cache hit for {}", key);
                Some(entry.clone())
            }
            None => {
                debug!("cache miss for {}", key);
                None
            }
        }
    }

    async fn put(&self, key: &str, payload: Value) {
        let entry = CacheEntry {
            payload,
            updated_at: Utc::now(),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        debug!("cached {}", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = MemoryCache::new();
        assert!(cache.get(keys::TRENDING).await.is_none());
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = MemoryCache::new();
        cache.put(keys::TRENDING, json!([{"id": 1}])).await;

        let entry = cache.get(keys::TRENDING).await.unwrap();
        assert_eq!(entry.payload, json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn writes_overwrite_wholesale() {
        let cache = MemoryCache::new();
        cache.put(keys::NOW_PLAYING, json!([{"id": 1}, {"id": 2}])).await;
        cache.put(keys::NOW_PLAYING, json!([{"id": 3}])).await;

        let entry = cache.get(keys::NOW_PLAYING).await.unwrap();
        assert_eq!(entry.payload, json!([{"id": 3}]));
    }

    #[tokio::test]
    async fn keys_do_not_collide() {
        let cache = MemoryCache::new();
        cache.put(&keys::movie_key(550), json!({"id": 550})).await;

        assert!(cache.get(&keys::movie_key(550)).await.is_some());
        assert!(cache.get(&keys::movie_key(551)).await.is_none());
        assert!(cache.get(keys::TRENDING).await.is_none());
    }
}
