/// Fixed-TTL cache for list responses
///
/// Entries expire a fixed time after they were stored and are never
/// invalidated by writes: a list fetched within the TTL can be stale.
/// Expired entries are dropped lazily on lookup.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Which listing a cached body belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    ProjectList,

    /// Task listing, per project filter (`None` = unfiltered)
    TaskList { project: Option<Uuid> },
}

#[derive(Debug)]
struct CachedResponse {
    body: Arc<Value>,
    expires_at: Instant,
}

/// A cache hit: the stored body and how long it stays fresh
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub body: Arc<Value>,
    pub remaining: Duration,
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<CacheKey, CachedResponse>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached body if it has not expired
    pub fn get(&self, key: &CacheKey) -> Option<CacheHit> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(CacheHit {
                    body: entry.body.clone(),
                    remaining: entry.expires_at - now,
                });
            }
        }

        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    /// Stores a body for `ttl`, replacing any previous entry
    pub fn insert(&self, key: CacheKey, body: Value, ttl: Duration) -> Arc<Value> {
        let body = Arc::new(body);

        self.entries.insert(
            key,
            CachedResponse {
                body: body.clone(),
                expires_at: Instant::now() + ttl,
            },
        );

        body
    }

    /// Number of stored entries, including ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
