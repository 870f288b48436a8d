//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for ledger logging.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "checkpoint-ledger".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LEDGER_SERVICE_NAME`: Service name (default: checkpoint-ledger)
    /// - `LEDGER_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `LEDGER_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `LEDGER_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("LEDGER_SERVICE_NAME")
                .unwrap_or_else(|_| "checkpoint-ledger".to_string()),

            log_level: env::var("LEDGER_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("LEDGER_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("LEDGER_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),
        }
    }

    /// Set the log level filter.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Switch JSON output on or off.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "checkpoint-ledger");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_builder() {
        let config = TelemetryConfig::default()
            .with_log_level("checkpoint_ledger=debug")
            .with_json_logs(true);
        assert_eq!(config.log_level, "checkpoint_ledger=debug");
        assert!(config.json_logs);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE", false));
        assert!(parse_flag("1", false));
        assert!(!parse_flag("off", true));
        assert!(parse_flag("garbage", true));
        assert!(!parse_flag("garbage", false));
    }
}
