//! # Ledger Telemetry
//!
//! Observability for the checkpoint ledger.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an env filter and a
//!   pretty or JSON formatter.
//! - **Metrics**: Prometheus counters for checkpoint progress, stale writes
//!   and identity folding. Opening a ledger registers them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LEDGER_SERVICE_NAME` | `checkpoint-ledger` | Service name in logs |
//! | `LEDGER_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `LEDGER_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |
//! | `LEDGER_CONSOLE_OUTPUT` | `true` | Write logs to stdout at all |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, BACKFILLS_COMPLETED, CHAIN_VERIFICATIONS,
    CHECKPOINT_ADVANCES, IDENTITY_ROWS_WRITTEN, STALE_WRITES_IGNORED,
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

/// Convenience macro for adding to a counter.
#[macro_export]
macro_rules! metric_add {
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).inc_by($value)
    };
}
