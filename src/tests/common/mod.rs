// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use http::{Method, StatusCode};
use serde_json::Value;

use crate::cache::memory_segment::MemorySegment;
use crate::cache::segment::{CacheEntry, CacheSegment};
use crate::config::connectors::ConnectorConfig;
use crate::error::TransportError;
use crate::transport::requester::{TokenHttpResponse, TokenRequester};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn connector_config(name: &str) -> ConnectorConfig {
    ConnectorConfig {
        connector_name: name.to_owned(),
        client_id: Some("1000.CLIENTID".into()),
        client_secret: Some("client-secret".into()),
        auth_url: Some("https://accounts.example.com/oauth/v2/token".into()),
        refresh_url: Some("https://accounts.example.com/oauth/v2/token".into()),
        redirect_url: Some("https://app.example.com/callback".into()),
        refresh_token: Some("1000.refresh".into()),
        expires_in: Some(3600),
        refresh_in: None,
    }
}

/// Memory segment that counts round trips.
#[derive(Clone, Default)]
pub struct CountingCache {
    pub segment: MemorySegment,
    gets: Arc<AtomicUsize>,
    puts: Arc<AtomicUsize>,
    last_ttl_hours: Arc<AtomicU64>,
}

impl CountingCache {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn last_ttl_hours(&self) -> u64 {
        self.last_ttl_hours.load(Ordering::SeqCst)
    }
}

impl CacheSegment for CountingCache {
    async fn get(&self, key: &str) -> Result<CacheEntry, TransportError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.segment.get(key).await
    }

    async fn put(&self, key: &str, value: &Value, ttl_hours: u64) -> Result<(), TransportError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.last_ttl_hours.store(ttl_hours, Ordering::SeqCst);
        self.segment.put(key, value, ttl_hours).await
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub form: HashMap<String, String>,
}

/// Token endpoint answering from a script: `Ok(json)` or `Err(status)`.
#[derive(Clone, Default)]
pub struct ScriptedRequester {
    responses: Arc<Mutex<VecDeque<Result<Value, u16>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ScriptedRequester {
    pub fn new(responses: Vec<Result<Value, u16>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl TokenRequester for ScriptedRequester {
    async fn request(
        &self,
        method: Method,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenHttpResponse, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_owned(),
            form: form.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        });
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected token endpoint request");
        match next {
            Ok(response_json) => Ok(TokenHttpResponse { status: StatusCode::OK, response_json }),
            Err(status) => Err(TransportError::Status {
                url: url.to_owned(),
                status: StatusCode::from_u16(status).unwrap(),
                body: String::new(),
            }),
        }
    }
}
