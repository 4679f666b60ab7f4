//! # Proxy Telemetry
//!
//! Structured logging and Prometheus metrics for the Verified-SMS proxy.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use proxy_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! proxy_telemetry::metric_inc!(proxy_telemetry::PARTS_FORWARDED);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VP_SERVICE_NAME` | `vsms-proxy` | Service name in log lines |
//! | `VP_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `VP_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, BACKEND_REQUEST_DURATION, BACKEND_RETRIES,
    DISPATCH_OUTCOMES, HASH_SUBMISSIONS, PARTS_FORWARDED, REGISTRY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
