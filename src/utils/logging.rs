use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use anyhow::Result;
use crate::config::connectors::ServiceConfig;
use crate::config::settings::{LogFormat, LoggingConfig};


#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "trace",
            LogLevel::DEBUG => "debug",
            LogLevel::INFO => "info",
            LogLevel::WARN => "warn",
            LogLevel::ERROR => "error",
        }
    }
}

/// Resolves the logging config: cli level first, then the config file, then `info`.
pub fn resolve(service_config: Option<&ServiceConfig>, arg_log_level: Option<LogLevel>) -> LoggingConfig {
    let configured = service_config.and_then(|config| config.settings.logging.as_ref());
    let level = arg_log_level
        .map(|level| level.as_str().to_owned())
        .or_else(|| configured.map(|config| config.level.to_owned()))
        .unwrap_or_else(|| "info".to_owned());
    let format = configured
        .map(|config| config.format.to_owned())
        .unwrap_or(LogFormat::Compact);

    LoggingConfig::new(level, format)
}

pub fn run(service_config: Option<&ServiceConfig>, arg_log_level: Option<LogLevel>) -> Result<()> {
    init_logging(&resolve(service_config, arg_log_level));
    Ok(())
}


/// Initialize tracing with the desired config.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&cfg.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Base layer: filter + writer
    let registry = tracing_subscriber::registry().with(env_filter);

    // Choose format layer
    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_writer(std::io::stderr)
                .flatten_event(true) // flattens fields, good for CRI log parsers
                .with_ansi(false); // CRI parsers dislike ANSI color codes

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_writer(std::io::stderr)
                .with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::SettingsConfig;
    use std::collections::HashMap;

    #[test]
    fn cli_level_wins_over_config() {
        let mut settings = SettingsConfig::default();
        settings.logging = Some(LoggingConfig::new("warn".into(), LogFormat::Json));
        let config = ServiceConfig { settings, connectors: HashMap::new() };

        let resolved = resolve(Some(&config), Some(LogLevel::DEBUG));
        assert_eq!(resolved.level, "debug");
        assert_eq!(resolved.format, LogFormat::Json);

        let resolved = resolve(Some(&config), None);
        assert_eq!(resolved.level, "warn");

        let resolved = resolve(None, None);
        assert_eq!(resolved.level, "info");
        assert_eq!(resolved.format, LogFormat::Compact);
    }
}
