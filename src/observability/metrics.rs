use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token lookups
    pub token_requests: IntCounterVec,
    pub token_failures: IntCounterVec,
    pub token_exchange_duration: HistogramVec,
    pub token_expiry_unix_ms: IntGaugeVec,

    // Cache
    pub cache_writes: IntCounterVec,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("connector_auth".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            token_requests: IntCounterVec::new(Opts::new("token_requests_total", "Tokens served by connector and source (memory, cache, network)"), &["connector", "source"]).unwrap(),
            token_failures: IntCounterVec::new(Opts::new("token_failures_total", "Token acquisition failures by reason"), &["connector", "reason"]).unwrap(),
            token_exchange_duration: HistogramVec::new(HistogramOpts::new("token_exchange_duration_seconds", "Token endpoint round trip seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["connector", "grant_type"]).unwrap(),
            token_expiry_unix_ms: IntGaugeVec::new(Opts::new("token_expiry_unix_ms", "Expiry of the current token"), &["connector"]).unwrap(),

            cache_writes: IntCounterVec::new(Opts::new("cache_writes_total", "Tokens persisted to the cache segment"), &["connector"]).unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_exchange_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix_ms.clone())).unwrap();
        reg.register(Box::new(metrics.cache_writes.clone())).unwrap();

        metrics
    }

    /// Prometheus text exposition of the registry.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_registered_counters() {
        let metrics = get_metrics().await;
        metrics.token_requests.with_label_values(&["render_test", "memory"]).inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("connector_auth_token_requests_total"));
        assert!(text.contains("render_test"));
    }
}
