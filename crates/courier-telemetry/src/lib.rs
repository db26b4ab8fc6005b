//! Logging and metrics for the Courier HTTP client.
//!
//! - **Logging**: `tracing-subscriber` installation with JSON or pretty
//!   output and an `EnvFilter`
//! - **Metrics**: per-call counters and latency histograms through the
//!   `metrics` facade, with an optional Prometheus exporter
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 HttpClient                   │
//! │   tracing events        record_call(...)     │
//! └──────────┬────────────────────┬──────────────┘
//!            ▼                    ▼
//!     ┌─────────────┐     ┌───────────────┐
//!     │ init_logging│     │ init_metrics  │
//!     │ json/pretty │     │  Prometheus   │
//!     └──────┬──────┘     └───────┬───────┘
//!            ▼                    ▼
//!      stdout/stderr        /metrics or render_metrics()
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_telemetry::{init_logging, init_metrics, LogConfig, MetricsConfig};
//!
//! init_logging(&LogConfig::production())?;
//! init_metrics(&MetricsConfig {
//!     listen_addr: Some("0.0.0.0:9090".to_string()),
//!     ..Default::default()
//! })?;
//! ```

#![doc(html_root_url = "https://docs.rs/courier-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};
pub use crate::metrics::{
    init_metrics, record_call, record_transport_failure, render_metrics, InFlightGuard,
    MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
