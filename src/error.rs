use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by a connector while acquiring a token.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// A required configuration value is missing. Fix the config, do not retry.
    #[error("invalid connector configuration: {0}")]
    Configuration(String),

    /// The token endpoint answered without a field we need. `response` may
    /// carry live tokens and is kept out of the message.
    #[error("invalid auth response: '{key}' is missing in the response json")]
    AuthResponse { key: String, response: Value },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ConnectorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ConnectorError::Configuration(message.into())
    }

    pub fn auth_response(key: &str, response: &Value) -> Self {
        ConnectorError::AuthResponse {
            key: key.to_owned(),
            response: response.clone(),
        }
    }

    /// Short label used for failure metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ConnectorError::Configuration(_) => "configuration",
            ConnectorError::AuthResponse { .. } => "auth_response",
            ConnectorError::Transport(TransportError::Cache(_)) => "cache",
            ConnectorError::Transport(_) => "transport",
        }
    }
}

/// Network or storage failure while talking to the token endpoint or the cache store.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("response from {url} is not valid json: {source}")]
    InvalidBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache store failure: {0}")]
    Cache(String),
}

impl TransportError {
    pub fn cache(message: impl Into<String>) -> Self {
        TransportError::Cache(message.into())
    }
}
