use crate::config::connectors::ServiceConfig;
use crate::config::settings::{LogFormat, LoggingConfig};

pub fn initiate_default_values(mut config: ServiceConfig) -> ServiceConfig {
    if config.settings.logging.is_none() {
        config.settings.logging = Some(LoggingConfig::new("info".to_owned(), LogFormat::Compact));
    }

    config.connectors = config
        .connectors
        .into_iter()
        .map(|(connector_name, mut connector_config)| {
            // propogate map key to ConnectorConfig
            connector_config.connector_name = connector_name.to_owned();
            connector_config.client_id = trimmed(connector_config.client_id);
            connector_config.client_secret = trimmed(connector_config.client_secret);
            connector_config.auth_url = trimmed(connector_config.auth_url);
            connector_config.refresh_url = trimmed(connector_config.refresh_url);
            connector_config.redirect_url = trimmed(connector_config.redirect_url);
            connector_config.refresh_token = trimmed(connector_config.refresh_token);
            (connector_name, connector_config)
        })
        .collect();

    config
}

/// Blank values behave like absent ones.
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
