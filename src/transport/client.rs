use std::time::Duration;

use http::Method;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::transport::requester::{TokenHttpResponse, TokenRequester};

/// [`TokenRequester`] on top of a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpRequester {
    client: Client,
}

impl HttpRequester {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout_ms: u64) -> Result<Self, TransportError> {
        let client = build_client(timeout_ms)?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

pub fn build_client(timeout_ms: u64) -> Result<Client, TransportError> {
    let client = Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?;
    Ok(client)
}

impl TokenRequester for HttpRequester {
    async fn request(
        &self,
        method: Method,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenHttpResponse, TransportError> {
        debug!(%method, url, "token endpoint request");
        let response = self
            .client
            .request(method, url)
            .header(http::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(url, %status, "token endpoint rejected request");
            return Err(TransportError::Status { url: url.to_owned(), status, body });
        }

        let response_json: Value = serde_json::from_str(&body)
            .map_err(|source| TransportError::InvalidBody { url: url.to_owned(), source })?;
        Ok(TokenHttpResponse { status, response_json })
    }
}
