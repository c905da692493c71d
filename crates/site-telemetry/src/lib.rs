//! # Site Telemetry
//!
//! Structured logging setup and the in-process metrics counter.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use site_telemetry::{init_logging, MetricsRegistry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! let metrics = Arc::new(MetricsRegistry::new());
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `site-19sixtyfive` | Service name in logs |
//! | `SITE_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `SITE_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    counter_key, MetricsRegistry, HTTP_REQUESTS_TOTAL, REVALIDATIONS_TOTAL, UPSTREAM_ERRORS_TOTAL,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
