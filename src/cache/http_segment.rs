use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::segment::{CacheEntry, CacheSegment};
use crate::error::TransportError;

#[derive(Debug, Serialize)]
struct PutCacheRequest<'a> {
    cache_name: &'a str,
    cache_value: String,
    expiry_in_hours: u64,
}

/// Remote cache segment behind a REST api.
///
/// `GET <url>?cacheKey=<key>` answers `{"cache_value": ...}`, optionally wrapped in
/// `{"data": ...}`. `POST <url>` stores `{cache_name, cache_value, expiry_in_hours}`.
#[derive(Debug, Clone)]
pub struct HttpSegment {
    client: Client,
    url: String,
    auth_header: Option<String>,
}

impl HttpSegment {
    pub fn new(client: Client, url: String, auth_header: Option<String>) -> Self {
        Self { client, url, auth_header }
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_header {
            Some(value) => request.header(http::header::AUTHORIZATION, value),
            None => request,
        }
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<String, TransportError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status { url: self.url.clone(), status, body });
        }
        Ok(body)
    }
}

fn entry_from_body(body: &Value) -> CacheEntry {
    let payload = body.get("data").unwrap_or(body);
    let cache_value = match payload.get("cache_value") {
        Some(Value::String(value)) => Some(value.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };
    CacheEntry { cache_value }
}

impl CacheSegment for HttpSegment {
    async fn get(&self, key: &str) -> Result<CacheEntry, TransportError> {
        let request = self.with_auth(self.client.get(&self.url).query(&[("cacheKey", key)]));
        let response = request.send().await?;
        let body = self.read_body(response).await?;
        if body.trim().is_empty() {
            return Ok(CacheEntry::miss());
        }
        let json: Value = serde_json::from_str(&body)
            .map_err(|source| TransportError::InvalidBody { url: self.url.clone(), source })?;
        Ok(entry_from_body(&json))
    }

    async fn put(&self, key: &str, value: &Value, ttl_hours: u64) -> Result<(), TransportError> {
        let payload = PutCacheRequest {
            cache_name: key,
            cache_value: value.to_string(),
            expiry_in_hours: ttl_hours,
        };
        let request = self.with_auth(self.client.post(&self.url).json(&payload));
        let response = request.send().await?;
        self.read_body(response).await?;
        debug!(url = %self.url, ttl_hours, "stored cache entry");
        Ok(())
    }
}
