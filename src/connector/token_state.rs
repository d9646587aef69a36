use serde::{Deserialize, Serialize};

/// In-memory token of one connector.
#[derive(Debug, Clone, Default)]
pub struct TokenState {
    access_token: Option<String>,
    expires_at: Option<i64>, // unix ms
}

impl TokenState {
    pub fn set(&mut self, access_token: String, expires_at: i64) {
        self.access_token = Some(access_token);
        self.expires_at = Some(expires_at);
    }

    /// Token if it is present and `expires_at` is strictly after `now_ms`.
    pub fn valid_token(&self, now_ms: i64) -> Option<&str> {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires_at)) if expires_at > now_ms => Some(token.as_str()),
            _ => None,
        }
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    pub fn clear(&mut self) {
        self.access_token = None;
        self.expires_at = None;
    }
}

/// Token document persisted in the cache segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    pub expires_at: i64,
}

impl CachedToken {
    /// `None` unless the value is json of the expected shape.
    pub fn parse(value: &str) -> Option<Self> {
        serde_json::from_str(value).ok()
    }
}
