use chrono::Utc;
use tokio::time::Instant;

use crate::utils::constants::{EXPIRY_SAFETY_MARGIN_MS, MS_PER_HOUR, SECONDS_PER_HOUR};

/// Milliseconds since the unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

/// Absolute expiry of a freshly issued token.
///
/// A configured `refresh_in` wins over the issuer's `expires_in`; otherwise the
/// token is considered expired 15 minutes before the issuer says so.
/// Out of range lifetimes saturate instead of overflowing.
pub fn compute_expires_at(now_ms: i64, expires_in: i64, refresh_in: Option<u64>) -> i64 {
    match refresh_in {
        Some(refresh_in) => now_ms.saturating_add(seconds_to_ms(refresh_in)),
        None => now_ms
            .saturating_add(expires_in.saturating_mul(1000))
            .saturating_sub(EXPIRY_SAFETY_MARGIN_MS),
    }
}

fn seconds_to_ms(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX).saturating_mul(1000)
}

/// Cache TTL in hours for a token living `expires_in` seconds, never below one hour.
pub fn cache_ttl_hours(expires_in: i64) -> u64 {
    let seconds = expires_in.max(0) as u64;
    seconds.div_ceil(SECONDS_PER_HOUR).max(1)
}

pub fn hours_to_ms(hours: u64) -> i64 {
    i64::try_from(hours).unwrap_or(i64::MAX).saturating_mul(MS_PER_HOUR)
}
