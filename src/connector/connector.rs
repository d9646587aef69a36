use std::fmt;

use http::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::segment::CacheSegment;
use crate::config::connectors::ConnectorConfig;
use crate::connector::hash::{connector_hash, format_cache_key};
use crate::connector::response::{Grant, TokenResponse};
use crate::connector::token_state::{CachedToken, TokenState};
use crate::error::{ConnectorError, TransportError};
use crate::helpers::time::{cache_ttl_hours, compute_expires_at, get_instant, now_ms};
use crate::observability::metrics::get_metrics;
use crate::transport::requester::TokenRequester;
use crate::utils::constants::{
    CLIENT_ID, CLIENT_SECRET, CODE, GRANT_TYPE, REDIRECT_URI, REFRESH_TOKEN, SOURCE_CACHE,
    SOURCE_MEMORY, SOURCE_NETWORK,
};

/// OAuth identity of one third-party api.
///
/// Hands out access tokens from memory, then from the cache segment, then from
/// the refresh endpoint. Every token obtained over the network is written back
/// to the cache under a key derived from the configuration, so processes
/// sharing the segment reuse each other's tokens.
pub struct Connector<C, R> {
    connector_name: String,
    client_id: String,
    client_secret: String,
    auth_url: String,
    refresh_url: String,
    redirect_url: String,
    refresh_token: String,
    expires_in: Option<i64>,
    refresh_in: Option<u64>,

    state: TokenState,
    /// cleared, together with `state`, by every setter of a hashed field
    cache_key: Option<String>,

    cache: C,
    requester: R,
}

impl<C, R> Connector<C, R>
where
    C: CacheSegment,
    R: TokenRequester,
{
    pub fn new(config: &ConnectorConfig, cache: C, requester: R) -> Self {
        Self {
            connector_name: config.connector_name.to_owned(),
            client_id: config.client_id.clone().unwrap_or_default(),
            client_secret: config.client_secret.clone().unwrap_or_default(),
            auth_url: config.auth_url.clone().unwrap_or_default(),
            refresh_url: config.refresh_url.clone().unwrap_or_default(),
            redirect_url: config.redirect_url.clone().unwrap_or_default(),
            refresh_token: config.refresh_token.clone().unwrap_or_default(),
            expires_in: config.expires_in.map(|v| i64::try_from(v).unwrap_or(i64::MAX)),
            // zero means "not configured"
            refresh_in: config.refresh_in.filter(|v| *v > 0),
            state: TokenState::default(),
            cache_key: None,
            cache,
            requester,
        }
    }

    pub fn connector_name(&self) -> &str {
        &self.connector_name
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn expires_in(&self) -> Option<i64> {
        self.expires_in
    }

    pub fn refresh_in(&self) -> Option<u64> {
        self.refresh_in
    }

    /// Expiry of the in-memory token, unix ms.
    pub fn expires_at(&self) -> Option<i64> {
        self.state.expires_at()
    }

    pub fn set_client_id(&mut self, value: impl Into<String>) {
        self.client_id = value.into();
        self.invalidate();
    }

    pub fn set_client_secret(&mut self, value: impl Into<String>) {
        self.client_secret = value.into();
        self.invalidate();
    }

    pub fn set_auth_url(&mut self, value: impl Into<String>) {
        self.auth_url = value.into();
        self.invalidate();
    }

    pub fn set_refresh_url(&mut self, value: impl Into<String>) {
        self.refresh_url = value.into();
        self.invalidate();
    }

    pub fn set_redirect_url(&mut self, value: impl Into<String>) {
        self.redirect_url = value.into();
        self.invalidate();
    }

    pub fn set_refresh_token(&mut self, value: impl Into<String>) {
        self.refresh_token = value.into();
        self.invalidate();
    }

    pub fn set_refresh_in(&mut self, value: Option<u64>) {
        self.refresh_in = value.filter(|v| *v > 0);
    }

    /// Drops the memoized key and the token issued for the previous identity.
    fn invalidate(&mut self) {
        self.cache_key = None;
        self.state.clear();
    }

    /// `ZC_CONN_<name>:<hash>`, recomputed after any configuration change.
    pub fn cache_key(&mut self) -> &str {
        self.cache_key
            .get_or_insert_with(|| {
                let hash = connector_hash(&[
                    self.refresh_token.as_str(),
                    self.client_id.as_str(),
                    self.client_secret.as_str(),
                    self.auth_url.as_str(),
                    self.refresh_url.as_str(),
                    self.redirect_url.as_str(),
                ]);
                format_cache_key(&self.connector_name, &hash)
            })
            .as_str()
    }

    /// Exchanges a one-time authorization code for an access and a refresh token.
    pub async fn generate_access_token(&mut self, code: &str) -> Result<String, ConnectorError> {
        let result = self.exchange_authorization_code(code).await;
        match &result {
            Ok(_) => self.record_served(SOURCE_NETWORK).await,
            Err(err) => self.record_failure(err).await,
        }
        result
    }

    /// A valid access token, refreshed over the network only when memory and
    /// cache both miss.
    pub async fn get_access_token(&mut self) -> Result<String, ConnectorError> {
        match self.lookup_access_token().await {
            Ok((token, source)) => {
                self.record_served(source).await;
                Ok(token)
            }
            Err(err) => {
                self.record_failure(&err).await;
                Err(err)
            }
        }
    }

    async fn exchange_authorization_code(&mut self, code: &str) -> Result<String, ConnectorError> {
        require_non_empty(code, "grant_token")?;
        require_non_empty(&self.redirect_url, "redirect_url")?;
        require_non_empty(&self.auth_url, "auth_url")?;

        info!(connector = %self.connector_name, "exchanging authorization code");
        let response = {
            let form = [
                (GRANT_TYPE, Grant::AuthorizationCode.as_str()),
                (CODE, code),
                (CLIENT_ID, self.client_id.as_str()),
                (CLIENT_SECRET, self.client_secret.as_str()),
                (REDIRECT_URI, self.redirect_url.as_str()),
            ];
            self.call_token_endpoint(&self.auth_url, &form, Grant::AuthorizationCode)
                .await?
        };
        self.process_token_response(&response, Grant::AuthorizationCode)
            .await
    }

    async fn lookup_access_token(&mut self) -> Result<(String, &'static str), ConnectorError> {
        if let Some(token) = self.state.valid_token(now_ms()) {
            return Ok((token.to_owned(), SOURCE_MEMORY));
        }

        let key = self.cache_key().to_owned();
        let entry = self.cache.get(&key).await?;
        if let Some(value) = entry.cache_value.as_deref() {
            match CachedToken::parse(value) {
                Some(cached) => {
                    self.state.set(cached.access_token, cached.expires_at);
                    if let Some(token) = self.state.valid_token(now_ms()) {
                        debug!(connector = %self.connector_name, key = %key, "access token served from cache");
                        return Ok((token.to_owned(), SOURCE_CACHE));
                    }
                    debug!(connector = %self.connector_name, key = %key, "cached access token expired");
                }
                None => {
                    warn!(connector = %self.connector_name, key = %key, "ignoring malformed cache entry");
                }
            }
        }

        require_non_empty(&self.refresh_token, "refresh_token")?;
        require_non_empty(&self.refresh_url, "refresh_url")?;

        info!(connector = %self.connector_name, "refreshing access token");
        let response = {
            let form = [
                (GRANT_TYPE, Grant::RefreshToken.as_str()),
                (CLIENT_ID, self.client_id.as_str()),
                (CLIENT_SECRET, self.client_secret.as_str()),
                (REFRESH_TOKEN, self.refresh_token.as_str()),
            ];
            self.call_token_endpoint(&self.refresh_url, &form, Grant::RefreshToken)
                .await?
        };
        let token = self
            .process_token_response(&response, Grant::RefreshToken)
            .await?;
        Ok((token, SOURCE_NETWORK))
    }

    async fn call_token_endpoint(
        &self,
        url: &str,
        form: &[(&str, &str)],
        grant: Grant,
    ) -> Result<Value, ConnectorError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        let response = self.requester.request(Method::POST, url, form).await;
        metrics
            .token_exchange_duration
            .with_label_values(&[self.connector_name.as_str(), grant.as_str()])
            .observe(start.elapsed().as_secs_f64());
        Ok(response?.response_json)
    }

    /// Commits a token endpoint answer to memory, then to the cache segment.
    async fn process_token_response(
        &mut self,
        response: &Value,
        grant: Grant,
    ) -> Result<String, ConnectorError> {
        let parsed = TokenResponse::from_json(response, grant)?;
        let expires_at = compute_expires_at(now_ms(), parsed.expires_in, self.refresh_in);

        if let Some(refresh_token) = parsed.refresh_token {
            self.set_refresh_token(refresh_token);
        }
        self.expires_in = Some(parsed.expires_in);
        self.state.set(parsed.access_token.clone(), expires_at);

        self.persist_token_in_cache(CachedToken {
            access_token: parsed.access_token.clone(),
            expires_in: parsed.expires_in,
            expires_at,
        })
        .await?;

        get_metrics()
            .await
            .token_expiry_unix_ms
            .with_label_values(&[self.connector_name.as_str()])
            .set(expires_at);
        info!(connector = %self.connector_name, grant = grant.as_str(), expires_at, "access token issued");
        Ok(parsed.access_token)
    }

    async fn persist_token_in_cache(&mut self, token: CachedToken) -> Result<(), ConnectorError> {
        let ttl_hours = cache_ttl_hours(token.expires_in);
        let value = serde_json::to_value(&token)
            .map_err(|e| TransportError::cache(format!("encode cached token: {}", e)))?;
        let key = self.cache_key().to_owned();
        self.cache.put(&key, &value, ttl_hours).await?;

        get_metrics()
            .await
            .cache_writes
            .with_label_values(&[self.connector_name.as_str()])
            .inc();
        debug!(connector = %self.connector_name, key = %key, ttl_hours, "access token cached");
        Ok(())
    }

    async fn record_served(&self, source: &str) {
        get_metrics()
            .await
            .token_requests
            .with_label_values(&[self.connector_name.as_str(), source])
            .inc();
    }

    /// Failures are labelled by error kind only; the stage that failed is in the error.
    async fn record_failure(&self, err: &ConnectorError) {
        warn!(connector = %self.connector_name, error = %err, "token acquisition failed");
        get_metrics()
            .await
            .token_failures
            .with_label_values(&[self.connector_name.as_str(), err.reason()])
            .inc();
    }
}

fn require_non_empty(value: &str, name: &str) -> Result<(), ConnectorError> {
    if value.trim().is_empty() {
        return Err(ConnectorError::configuration(format!(
            "{} must be a non-empty string",
            name
        )));
    }
    Ok(())
}

impl<C, R> fmt::Debug for Connector<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("connector_name", &self.connector_name)
            .field("auth_url", &self.auth_url)
            .field("refresh_url", &self.refresh_url)
            .field("redirect_url", &self.redirect_url)
            .field("expires_at", &self.state.expires_at())
            .finish_non_exhaustive()
    }
}
