//! Telemetry configuration from environment variables.

use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Name reported in log lines.
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info` or `vp_05_dispatch_gate=debug`.
    pub log_level: String,

    /// JSON lines instead of human-readable output.
    pub json_logs: bool,

    /// ANSI colours in human-readable output.
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "vsms-proxy".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

fn flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VP_SERVICE_NAME`: Service name (default: vsms-proxy)
    /// - `VP_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `VP_JSON_LOGS`: JSON output (default: true inside containers)
    /// - `NO_COLOR`: Disable ANSI colours when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let in_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("VP_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("VP_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("VP_JSON_LOGS")
                .map(|v| flag(&v))
                .unwrap_or(in_container),
            ansi: lookup("NO_COLOR").is_none(),
        }
    }
}
