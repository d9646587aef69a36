use std::future::Future;

use serde::Deserialize;
use serde_json::Value;

use crate::error::TransportError;

/// Result of a cache lookup. `cache_value` is absent on a miss or an expired entry.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    #[serde(default)]
    pub cache_value: Option<String>,
}

impl CacheEntry {
    pub fn hit(value: String) -> Self {
        Self { cache_value: Some(value) }
    }

    pub fn miss() -> Self {
        Self { cache_value: None }
    }
}

/// Named partition of a key-value cache with per-entry TTL.
pub trait CacheSegment: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<CacheEntry, TransportError>> + Send;

    /// Stores `value` as its json text for `ttl_hours`.
    fn put(
        &self,
        key: &str,
        value: &Value,
        ttl_hours: u64,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
