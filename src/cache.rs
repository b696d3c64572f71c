//! In-memory response cache keyed by (topic, count).
//!
//! Avoids repeat upstream calls for identical requests within a freshness
//! window. Entries are evicted by age and, once over capacity, oldest first.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use crate::types::Question;

/// How long a cached question set stays fresh
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(30 * 60);
/// Maximum number of entries kept after a sweep
pub const MAX_ENTRIES: usize = 100;
/// How often the background sweep runs
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<Question>,
    timestamp: Instant,
}

/// TTL + capacity bounded cache for generated question sets
#[derive(Debug, Clone, Default)]
pub struct QuestionCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

/// Cache key: lower-cased topic concatenated with the question count
pub fn cache_key(topic: &str, count: u32) -> String {
    format!("{}_{}", topic.to_lowercase(), count)
}

impl QuestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached questions if the entry is still fresh.
    pub async fn get(&self, key: &str) -> Option<Vec<Question>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.timestamp.elapsed() < FRESHNESS_WINDOW {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    /// Insert or overwrite an entry with the current timestamp.
    pub async fn put(&self, key: String, data: Vec<Question>) {
        self.entries.write().await.insert(
            key,
            CacheEntry {
                data,
                timestamp: Instant::now(),
            },
        );
    }

    /// Drop expired entries, then evict oldest-first until the cap holds.
    pub async fn sweep(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.timestamp.elapsed() < FRESHNESS_WINDOW);

        if entries.len() > MAX_ENTRIES {
            let mut by_age: Vec<(String, Instant)> = entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.timestamp))
                .collect();
            by_age.sort_by_key(|(_, timestamp)| *timestamp);

            let excess = entries.len() - MAX_ENTRIES;
            for (key, _) in by_age.into_iter().take(excess) {
                entries.remove(&key);
            }
        }
    }

    /// Number of live entries (fresh or not)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Spawn the periodic cache sweep.
pub fn spawn_cache_sweeper(cache: QuestionCache) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        // First tick fires immediately; skip it so the sweep is truly periodic.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let before = cache.len().await;
            cache.sweep().await;
            let after = cache.len().await;
            if before != after {
                tracing::debug!(evicted = before - after, remaining = after, "cache sweep");
            }
        }
    });
}
