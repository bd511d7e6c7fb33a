//! Rate-limit counter stores.

use crate::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Window start and request count for one credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    /// Milliseconds since the Unix epoch.
    pub window_start_ms: u64,
    pub count: u64,
}

impl RateLimitState {
    pub fn starting_now(count: u64) -> Self {
        Self {
            window_start_ms: now_ms(),
            count,
        }
    }
}

/// Key-value store holding [`RateLimitState`] per credential key.
///
/// Counters must outlive a single batch: the budget is global per
/// credential. `increment_and_get` has to be atomic on its own; the limiter
/// serializes the surrounding read-modify-write within a process.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<RateLimitState>>;
    async fn set(&self, key: &str, state: RateLimitState) -> Result<()>;
    /// Bumps the count and returns the new value. A missing key starts a
    /// fresh window with a count of 1.
    async fn increment_and_get(&self, key: &str) -> Result<u64>;
    fn name(&self) -> &'static str;
}

#[derive(Default)]
pub struct MemoryRateLimitStore {
    entries: RwLock<HashMap<String, RateLimitState>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn get(&self, key: &str) -> Result<Option<RateLimitState>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).copied())
    }

    async fn set(&self, key: &str, state: RateLimitState) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), state);
        Ok(())
    }

    async fn increment_and_get(&self, key: &str) -> Result<u64> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitState::starting_now(0));
        entry.count += 1;
        Ok(entry.count)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

static GLOBAL_STORE: Lazy<Arc<MemoryRateLimitStore>> =
    Lazy::new(|| Arc::new(MemoryRateLimitStore::new()));

/// Process-wide store shared by every limiter that does not get its own.
pub fn global_store() -> Arc<dyn RateLimitStore> {
    GLOBAL_STORE.clone()
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_get_set() {
        let store = MemoryRateLimitStore::new();
        assert!(store.get("k").await.unwrap().is_none());

        let state = RateLimitState {
            window_start_ms: 42,
            count: 7,
        };
        tokio_test::assert_ok!(store.set("k", state).await);
        assert_eq!(store.get("k").await.unwrap(), Some(state));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_increment() {
        let store = MemoryRateLimitStore::new();
        assert_eq!(store.increment_and_get("k").await.unwrap(), 1);
        assert_eq!(store.increment_and_get("k").await.unwrap(), 2);

        store.set("k", RateLimitState::starting_now(10)).await.unwrap();
        assert_eq!(store.increment_and_get("k").await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_global_store_is_shared() {
        let a = global_store();
        let b = global_store();
        a.set("store-test-shared", RateLimitState::starting_now(3))
            .await
            .unwrap();
        assert_eq!(b.get("store-test-shared").await.unwrap().unwrap().count, 3);
    }
}
