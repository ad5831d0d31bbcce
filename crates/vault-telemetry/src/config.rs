//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration for an oracle node.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "vault-don".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VAULT_SERVICE_NAME`: Service name (default: vault-don)
    /// - `VAULT_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `VAULT_JSON_LOGS`: Enable JSON logs (default: true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("VAULT_SERVICE_NAME")
                .unwrap_or_else(|_| "vault-don".to_string()),

            log_level: env::var("VAULT_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("VAULT_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Configuration for one oracle in a local committee.
    pub fn for_oracle(oracle_id: u8) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("{}-oracle-{}", config.service_name, oracle_id);
        config
    }
}
