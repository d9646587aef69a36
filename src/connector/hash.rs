use crate::utils::constants::CACHE_KEY_PREFIX;

const HASH_BASE: i32 = 31;
const HASH_MASK: u32 = 0xFFFFF;

/// Deterministic 5 hex digit hash of the connector configuration.
///
/// Empty fields are skipped, the rest are joined with `:` and folded with a
/// base-31 polynomial rolling hash over unicode code points. Arithmetic wraps
/// in 32-bit signed integers so keys already written to a shared cache stay
/// readable.
pub fn connector_hash<S: AsRef<str>>(fields: &[S]) -> String {
    let joined = fields
        .iter()
        .map(|field| field.as_ref())
        .filter(|value| !value.is_empty())
        .collect::<Vec<&str>>()
        .join(":");

    let accumulator = joined.chars().fold(0i32, |acc, ch| {
        acc.wrapping_mul(HASH_BASE).wrapping_add(ch as i32)
    });
    let hash = HASH_BASE.wrapping_add(accumulator);

    format!("{:05x}", (hash as u32) & HASH_MASK)
}

pub fn format_cache_key(connector_name: &str, hash: &str) -> String {
    format!("{}{}:{}", CACHE_KEY_PREFIX, connector_name, hash)
}
