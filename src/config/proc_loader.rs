use std::{fs, path::Path};
use crate::config::proc_initiateor::initiate_default_values;
use crate::config::connectors::ServiceConfig;
use crate::config::proc_validator;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{debug, error};

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;

    let expanded = expand_env_vars(&content);
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<ServiceConfig> {
    let service_config: ServiceConfig = serde_yaml::from_str(&content)
        .inspect_err(|e| error!("parse config error: {}", e))?;

    let service_config = initiate_default_values(service_config);
    debug!("validation config ...");
    proc_validator::validate_service_config(&service_config)
        .map_err(|errors| anyhow!("config is not valid: {}", errors.join("; ")))?;

    Ok(service_config)
}

/// Replaces `${VAR}` and `${VAR:default}` with environment values.
pub fn expand_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]*))?\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_vars_are_expanded_with_defaults() {
        std::env::set_var("CONNECTOR_AUTH_TEST_SECRET", "s3cr3t");
        std::env::remove_var("CONNECTOR_AUTH_TEST_MISSING");

        let expanded = expand_env_vars(
            "a: ${CONNECTOR_AUTH_TEST_SECRET}\nb: ${CONNECTOR_AUTH_TEST_MISSING:fallback}\nc: ${CONNECTOR_AUTH_TEST_MISSING}\nd: ${CONNECTOR_AUTH_TEST_MISSING:}",
        );
        assert_eq!(expanded, "a: s3cr3t\nb: fallback\nc: \nd: ");

        std::env::remove_var("CONNECTOR_AUTH_TEST_SECRET");
    }
}
