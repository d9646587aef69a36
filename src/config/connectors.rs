use serde::Deserialize;
use std::collections::HashMap;

use crate::config::settings::SettingsConfig;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub connectors: HashMap<String, ConnectorConfig>,
}

/// ================================
/// Connectors
/// ================================
///
/// Values left empty in YAML (`refresh_token:`) deserialize as `None`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConnectorConfig {
    /// filled from the map key
    #[serde(default)]
    pub connector_name: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub auth_url: Option<String>,
    pub refresh_url: Option<String>,
    pub redirect_url: Option<String>,
    pub refresh_token: Option<String>,
    /// lifetime in seconds of the last issued access token
    pub expires_in: Option<u64>,
    /// when set, tokens are refreshed this many seconds after issue
    pub refresh_in: Option<u64>,
}
