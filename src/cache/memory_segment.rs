use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::segment::{CacheEntry, CacheSegment};
use crate::error::TransportError;
use crate::helpers::time::{hours_to_ms, now_ms};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at_ms: i64,
}

/// Process-local cache segment. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySegment {
    inner: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl MemorySegment {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl CacheSegment for MemorySegment {
    async fn get(&self, key: &str) -> Result<CacheEntry, TransportError> {
        let map = self.inner.read().await;
        let entry = map
            .get(key)
            .filter(|entry| now_ms() < entry.expires_at_ms)
            .map(|entry| CacheEntry::hit(entry.value.clone()))
            .unwrap_or_else(CacheEntry::miss);
        Ok(entry)
    }

    async fn put(&self, key: &str, value: &Value, ttl_hours: u64) -> Result<(), TransportError> {
        let now = now_ms();
        let entry = MemoryEntry {
            value: value.to_string(),
            expires_at_ms: now.saturating_add(hours_to_ms(ttl_hours)),
        };
        let mut map = self.inner.write().await;
        map.retain(|_, entry| now < entry.expires_at_ms);
        map.insert(key.to_owned(), entry);
        Ok(())
    }
}
