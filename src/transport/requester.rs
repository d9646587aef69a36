use std::future::Future;

use http::{Method, StatusCode};
use serde_json::Value;

use crate::error::TransportError;

/// Decoded answer of a token endpoint.
#[derive(Debug, Clone)]
pub struct TokenHttpResponse {
    pub status: StatusCode,
    pub response_json: Value,
}

/// Sends form-encoded requests to OAuth endpoints.
pub trait TokenRequester: Send + Sync {
    fn request(
        &self,
        method: Method,
        url: &str,
        form: &[(&str, &str)],
    ) -> impl Future<Output = Result<TokenHttpResponse, TransportError>> + Send;
}
