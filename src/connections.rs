use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::info;

use crate::cache::file_segment::FileSegment;
use crate::cache::http_segment::HttpSegment;
use crate::cache::memory_segment::MemorySegment;
use crate::cache::segment::CacheSegment;
use crate::cache::CacheStore;
use crate::config::connectors::{ConnectorConfig, ServiceConfig};
use crate::config::settings::CacheConfig;
use crate::connector::{Connector, SharedConnector};
use crate::error::ConnectorError;
use crate::transport::client::{build_client, HttpRequester};
use crate::transport::requester::TokenRequester;

/// All configured connectors, sharing one cache segment and one requester.
pub struct Connections<C, R> {
    connectors: HashMap<String, SharedConnector<C, R>>,
}

impl<C, R> Connections<C, R>
where
    C: CacheSegment + Clone,
    R: TokenRequester + Clone,
{
    pub fn new(configs: &HashMap<String, ConnectorConfig>, cache: C, requester: R) -> Self {
        let connectors = configs
            .iter()
            .map(|(name, config)| {
                let connector = Connector::new(config, cache.clone(), requester.clone());
                (name.to_owned(), SharedConnector::new(connector))
            })
            .collect();
        Self { connectors }
    }

    pub fn get_connector(&self, name: &str) -> Result<SharedConnector<C, R>, ConnectorError> {
        self.connectors
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectorError::configuration(format!("connector '{}' is not configured", name)))
    }

    /// Connector names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Connections<CacheStore, HttpRequester> {
    /// Wires the cache segment and http client described by the settings.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let client = build_client(config.settings.http.timeout_ms)
            .context("failed to build http client")?;
        let cache = build_cache_store(&config.settings.cache, &client);
        info!(
            cache = cache.kind(),
            connectors = config.connectors.len(),
            "connections initialized"
        );
        Ok(Self::new(&config.connectors, cache, HttpRequester::new(client)))
    }
}

pub fn build_cache_store(config: &CacheConfig, client: &reqwest::Client) -> CacheStore {
    match config {
        CacheConfig::Memory => CacheStore::Memory(MemorySegment::new()),
        CacheConfig::File { path } => CacheStore::File(FileSegment::new(path)),
        CacheConfig::Http { url, auth_header } => CacheStore::Http(HttpSegment::new(
            client.clone(),
            url.to_owned(),
            auth_header.to_owned(),
        )),
    }
}
