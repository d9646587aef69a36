// Connectors talking to a real HTTP token endpoint (axum on an ephemeral port):
//  - refresh and authorization code grants are form encoded
//  - concurrent callers of one shared connector trigger a single refresh
//  - endpoint rejections surface as transport errors

#[cfg(test)]
mod test {

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{routing::post, Form, Json, Router};
    use http::StatusCode;
    use serde_json::json;
    use tokio::time::sleep;

    use crate::cache::memory_segment::MemorySegment;
    use crate::connector::{Connector, SharedConnector};
    use crate::error::{ConnectorError, TransportError};
    use crate::tests::common::{connector_config, spawn_axum};
    use crate::transport::client::HttpRequester;

    type SeenForms = Arc<Mutex<Vec<HashMap<String, String>>>>;

    /// Token endpoint issuing `token-<n>` and recording every form it receives.
    fn token_router(hits: Arc<AtomicUsize>, seen: SeenForms, delay_ms: u64) -> Router {
        Router::new().route(
            "/oauth/v2/token",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let hits = hits.clone();
                let seen = seen.clone();
                async move {
                    sleep(Duration::from_millis(delay_ms)).await;
                    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
                    let authorization_code = form.get("grant_type").map(String::as_str) == Some("authorization_code");
                    seen.lock().unwrap().push(form);

                    let mut body = json!({"access_token": format!("token-{}", n), "expires_in": 3600});
                    if authorization_code {
                        body["refresh_token"] = json!(format!("refresh-{}", n));
                    }
                    Json(body)
                }
            }),
        )
    }

    fn endpoint_config(addr: std::net::SocketAddr) -> crate::config::connectors::ConnectorConfig {
        let url = format!("http://{}/oauth/v2/token", addr);
        let mut config = connector_config("crm");
        config.auth_url = Some(url.clone());
        config.refresh_url = Some(url);
        config
    }

    #[tokio::test]
    async fn refresh_grant_over_http() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen: SeenForms = Arc::default();
        let (handle, addr) = spawn_axum(token_router(hits.clone(), seen.clone(), 0)).await;

        let requester = HttpRequester::with_timeout(5000).unwrap();
        let mut connector = Connector::new(&endpoint_config(addr), MemorySegment::new(), requester);

        assert_eq!(connector.get_access_token().await.unwrap(), "token-1");
        assert_eq!(connector.get_access_token().await.unwrap(), "token-1");
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let form = seen.lock().unwrap()[0].clone();
        assert_eq!(form["grant_type"], "refresh_token");
        assert_eq!(form["refresh_token"], "1000.refresh");
        assert_eq!(form["client_id"], "1000.CLIENTID");
        assert_eq!(form["client_secret"], "client-secret");

        handle.abort();
    }

    #[tokio::test]
    async fn authorization_code_grant_over_http() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen: SeenForms = Arc::default();
        let (handle, addr) = spawn_axum(token_router(hits.clone(), seen.clone(), 0)).await;

        let cache = MemorySegment::new();
        let requester = HttpRequester::with_timeout(5000).unwrap();
        let mut connector = Connector::new(&endpoint_config(addr), cache.clone(), requester);

        assert_eq!(connector.generate_access_token("1000.grant").await.unwrap(), "token-1");
        assert_eq!(connector.refresh_token(), "refresh-1");
        assert_eq!(cache.len().await, 1);

        let form = seen.lock().unwrap()[0].clone();
        assert_eq!(form["grant_type"], "authorization_code");
        assert_eq!(form["code"], "1000.grant");
        assert_eq!(form["redirect_uri"], "https://app.example.com/callback");

        handle.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_refresh() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen: SeenForms = Arc::default();
        let (handle, addr) = spawn_axum(token_router(hits.clone(), seen, 100)).await;

        let requester = HttpRequester::with_timeout(5000).unwrap();
        let shared = SharedConnector::new(Connector::new(&endpoint_config(addr), MemorySegment::new(), requester));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                tokio::spawn(async move { shared.get_access_token().await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1, "refresh must run once");

        handle.abort();
    }

    #[tokio::test]
    async fn rejected_refresh_is_a_transport_error() {
        let router = Router::new().route(
            "/oauth/v2/token",
            post(|| async { (StatusCode::UNAUTHORIZED, r#"{"error":"invalid_client"}"#) }),
        );
        let (handle, addr) = spawn_axum(router).await;

        let requester = HttpRequester::with_timeout(5000).unwrap();
        let mut connector = Connector::new(&endpoint_config(addr), MemorySegment::new(), requester);

        match connector.get_access_token().await.unwrap_err() {
            ConnectorError::Transport(TransportError::Status { status, body, .. }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("invalid_client"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        handle.abort();
    }
}
