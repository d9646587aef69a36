use serde_json::Value;

use crate::error::ConnectorError;
use crate::utils::constants::{ACCESS_TOKEN, EXPIRES_IN, GRANT_AUTHORIZATION_CODE, GRANT_REFRESH_TOKEN, REFRESH_TOKEN};

/// Which OAuth grant produced a token response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    AuthorizationCode,
    RefreshToken,
}

impl Grant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grant::AuthorizationCode => GRANT_AUTHORIZATION_CODE,
            Grant::RefreshToken => GRANT_REFRESH_TOKEN,
        }
    }
}

/// Fields extracted from a token endpoint answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    /// Only read for the authorization code grant.
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Extracts the fields the grant requires, naming the first missing one on failure.
    pub fn from_json(response: &Value, grant: Grant) -> Result<Self, ConnectorError> {
        let access_token = string_field(response, ACCESS_TOKEN)?;
        let refresh_token = match grant {
            Grant::AuthorizationCode => Some(string_field(response, REFRESH_TOKEN)?),
            Grant::RefreshToken => None,
        };
        let expires_in = response
            .get(EXPIRES_IN)
            .and_then(coerce_int)
            .ok_or_else(|| ConnectorError::auth_response(EXPIRES_IN, response))?;

        Ok(Self { access_token, expires_in, refresh_token })
    }
}

fn string_field(response: &Value, key: &str) -> Result<String, ConnectorError> {
    response
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| ConnectorError::auth_response(key, response))
}

/// Issuers send `expires_in` as an integer, a float or a numeric string.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
