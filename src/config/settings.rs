use serde::Deserialize;

use crate::utils::constants::DEFAULT_HTTP_TIMEOUT_MS;

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// applies to token endpoints and the http cache segment
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_ms: DEFAULT_HTTP_TIMEOUT_MS }
    }
}

/// ================================
/// Cache segment
/// ================================
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CacheConfig {
    #[default]
    Memory,
    File {
        path: String,
    },
    Http {
        url: String,
        auth_header: Option<String>,
    },
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}
