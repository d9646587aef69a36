use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::cache::segment::CacheSegment;
use crate::connector::connector::Connector;
use crate::error::ConnectorError;
use crate::transport::requester::TokenRequester;

/// Connector that can be shared between tasks.
///
/// The lock is held for the whole memory, cache, network chain, so concurrent
/// callers wait for a refresh in flight instead of starting their own.
pub struct SharedConnector<C, R> {
    name: Arc<str>,
    inner: Arc<Mutex<Connector<C, R>>>,
}

impl<C, R> Clone for SharedConnector<C, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<C, R> SharedConnector<C, R>
where
    C: CacheSegment,
    R: TokenRequester,
{
    pub fn new(connector: Connector<C, R>) -> Self {
        Self {
            name: Arc::from(connector.connector_name()),
            inner: Arc::new(Mutex::new(connector)),
        }
    }

    pub fn connector_name(&self) -> &str {
        &self.name
    }

    pub async fn get_access_token(&self) -> Result<String, ConnectorError> {
        self.inner.lock().await.get_access_token().await
    }

    pub async fn generate_access_token(&self, code: &str) -> Result<String, ConnectorError> {
        self.inner.lock().await.generate_access_token(code).await
    }

    pub async fn cache_key(&self) -> String {
        self.inner.lock().await.cache_key().to_owned()
    }

    /// Exclusive access, e.g. to change credentials.
    pub async fn lock(&self) -> MutexGuard<'_, Connector<C, R>> {
        self.inner.lock().await
    }
}
