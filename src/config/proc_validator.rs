//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * connector credentials and endpoint urls
//!   * token lifetimes
//!   * cache segment settings
//!   * http timeout and logging level

use tracing::{error, info};

use crate::config::connectors::{ConnectorConfig, ServiceConfig};
use crate::config::settings::{CacheConfig, SettingsConfig};

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    if cfg.connectors.is_empty() {
        errors.push("config: 'connectors' is empty; at least one connector required".to_string());
    }

    let mut names: Vec<&String> = cfg.connectors.keys().collect();
    names.sort();
    for name in names {
        validate_connector(name, &cfg.connectors[name], &mut errors);
    }

    if errors.is_empty() {
        info!("config is valid");
        Ok(())
    } else {
        for e in &errors {
            error!("config error: {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.http.timeout_ms == 0 {
        errors.push("settings.http.timeout_ms must be greater than 0".to_string());
    }

    match &settings.cache {
        CacheConfig::Memory => {}
        CacheConfig::File { path } => {
            if path.trim().is_empty() {
                errors.push("settings.cache.path must be set for cache type 'file'".to_string());
            }
        }
        CacheConfig::Http { url, .. } => {
            validate_url("settings.cache.url", Some(url), errors);
        }
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_connector(name: &str, cfg: &ConnectorConfig, errors: &mut Vec<String>) {
    let path = format!("connectors['{}']", name);

    if name.trim().is_empty() {
        errors.push("connectors: connector name must not be empty".to_string());
    }

    for (field, value) in [
        ("client_id", &cfg.client_id),
        ("client_secret", &cfg.client_secret),
    ] {
        if value.as_deref().map_or(true, str::is_empty) {
            errors.push(format!("{}.{} is required", path, field));
        }
    }

    validate_url(&format!("{}.refresh_url", path), cfg.refresh_url.as_ref(), errors);
    // optional endpoints are only checked when present
    if cfg.auth_url.is_some() {
        validate_url(&format!("{}.auth_url", path), cfg.auth_url.as_ref(), errors);
    }
    if cfg.redirect_url.is_some() {
        validate_url(&format!("{}.redirect_url", path), cfg.redirect_url.as_ref(), errors);
    }

    if cfg.expires_in == Some(0) {
        errors.push(format!("{}.expires_in must be greater than 0", path));
    }
    if cfg.refresh_in == Some(0) {
        errors.push(format!("{}.refresh_in must be greater than 0", path));
    }
}

fn validate_url(path: &str, url: Option<&String>, errors: &mut Vec<String>) {
    match url.map(|u| u.trim()) {
        None | Some("") => errors.push(format!("{} is required", path)),
        Some(u) if !(u.starts_with("http://") || u.starts_with("https://")) => {
            errors.push(format!("{} '{}' must start with http:// or https://", path, u))
        }
        Some(_) => {}
    }
}
