//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CONFIG_PATH: &str = "connector-auth.yaml";

/// Prefix of every connector cache key.
pub const CACHE_KEY_PREFIX: &str = "ZC_CONN_";

/// Tokens are treated as expired this long before the issuer's `expires_in`.
pub const EXPIRY_SAFETY_MARGIN_MS: i64 = 900_000;
pub const SECONDS_PER_HOUR: u64 = 3600;
pub const MS_PER_HOUR: i64 = 3_600_000;

// OAuth wire keys
pub const GRANT_TYPE: &str = "grant_type";
pub const CODE: &str = "code";
pub const CLIENT_ID: &str = "client_id";
pub const CLIENT_SECRET: &str = "client_secret";
pub const REDIRECT_URI: &str = "redirect_uri";
pub const REFRESH_TOKEN: &str = "refresh_token";
pub const ACCESS_TOKEN: &str = "access_token";
pub const EXPIRES_IN: &str = "expires_in";

pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

// Token sources, used as metric labels
pub const SOURCE_MEMORY: &str = "memory";
pub const SOURCE_CACHE: &str = "cache";
pub const SOURCE_NETWORK: &str = "network";
