//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name printed at startup
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full directive
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Include source file and line in log lines
    pub with_source: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "sweet-gossip".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_source: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SG_SERVICE_NAME`: Service name (default: sweet-gossip)
    /// - `SG_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `SG_LOG_JSON`: Enable JSON logs (default: false)
    /// - `SG_LOG_SOURCE`: Include file/line (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: env::var("SG_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: env::var("SG_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: env::var("SG_LOG_JSON")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.json_logs),

            with_source: env::var("SG_LOG_SOURCE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.with_source),
        }
    }

    /// Same configuration with a different level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
