//! Cache segments used to persist connector tokens.

use serde_json::Value;

use crate::error::TransportError;

pub mod file_segment;
pub mod http_segment;
pub mod memory_segment;
pub mod segment;

use file_segment::FileSegment;
use http_segment::HttpSegment;
use memory_segment::MemorySegment;
use segment::{CacheEntry, CacheSegment};

/// Cache backend selected by configuration.
#[derive(Debug, Clone)]
pub enum CacheStore {
    Memory(MemorySegment),
    File(FileSegment),
    Http(HttpSegment),
}

impl CacheStore {
    pub fn kind(&self) -> &'static str {
        match self {
            CacheStore::Memory(_) => "memory",
            CacheStore::File(_) => "file",
            CacheStore::Http(_) => "http",
        }
    }
}

impl CacheSegment for CacheStore {
    async fn get(&self, key: &str) -> Result<CacheEntry, TransportError> {
        match self {
            CacheStore::Memory(s) => s.get(key).await,
            CacheStore::File(s) => s.get(key).await,
            CacheStore::Http(s) => s.get(key).await,
        }
    }

    async fn put(&self, key: &str, value: &Value, ttl_hours: u64) -> Result<(), TransportError> {
        match self {
            CacheStore::Memory(s) => s.put(key, value, ttl_hours).await,
            CacheStore::File(s) => s.put(key, value, ttl_hours).await,
            CacheStore::Http(s) => s.put(key, value, ttl_hours).await,
        }
    }
}
