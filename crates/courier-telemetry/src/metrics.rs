//! Call metrics for Courier.
//!
//! Metrics go through the `metrics` facade. Without an installed recorder
//! every recording function is a no-op, so the client records
//! unconditionally and applications opt in with [`init_metrics`].
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `courier_calls_total` | Counter | `method`, `outcome` | Completed calls |
//! | `courier_call_duration_seconds` | Histogram | `method` | Call latency |
//! | `courier_in_flight_calls` | Gauge | - | Calls currently running |
//! | `courier_transport_failures_total` | Counter | `kind` | Transport failures by kind |
//!
//! `outcome` is one of `success`, `failure` or `error`.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Completed call counter.
pub const CALLS_TOTAL: &str = "courier_calls_total";

/// Call duration histogram.
pub const CALL_DURATION_SECONDS: &str = "courier_call_duration_seconds";

/// In-flight call gauge.
pub const IN_FLIGHT_CALLS: &str = "courier_in_flight_calls";

/// Transport failure counter.
pub const TRANSPORT_FAILURES_TOTAL: &str = "courier_transport_failures_total";

/// Handle for rendering when the recorder was installed without a listener.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to serve `/metrics` on (e.g., "0.0.0.0:9090").
    ///
    /// When `None` the recorder is installed without a listener and the
    /// output is available through [`render_metrics`].
    pub listen_addr: Option<String>,

    /// Histogram buckets for call duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: None,
            // 5ms .. 30s; remote calls are slower than in-process handlers
            duration_buckets: vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder.
///
/// With a `listen_addr` the exporter serves `/metrics` itself; it runs on
/// the current Tokio runtime, or on a background thread outside of one.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparseable address and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(CALL_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    match &config.listen_addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            builder
                .with_http_listener(addr)
                .install()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        }
        None => {
            let handle = builder
                .install_recorder()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let _ = METRICS_HANDLE.set(handle);
        }
    }

    register_metric_descriptions();
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` unless [`init_metrics`] installed a recorder without a
/// listener.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(CALLS_TOTAL, "Total number of completed HTTP calls");
    describe_histogram!(CALL_DURATION_SECONDS, "HTTP call duration in seconds");
    describe_gauge!(IN_FLIGHT_CALLS, "Number of HTTP calls currently running");
    describe_counter!(
        TRANSPORT_FAILURES_TOTAL,
        "Total transport failures by kind"
    );
}

/// Records a completed call.
///
/// # Arguments
///
/// * `method` - The HTTP method
/// * `outcome` - `success`, `failure` or `error`
/// * `duration` - Wall time from dispatch to decoded outcome
pub fn record_call(method: &str, outcome: &str, duration: Duration) {
    counter!(
        CALLS_TOTAL,
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(CALL_DURATION_SECONDS, "method" => method.to_string())
        .record(duration.as_secs_f64());
}

/// Records a transport failure of the given kind.
pub fn record_transport_failure(kind: &str) {
    counter!(TRANSPORT_FAILURES_TOTAL, "kind" => kind.to_string()).increment(1);
}

/// Guard that tracks one in-flight call.
///
/// The gauge is decremented on drop, including when the call future is
/// dropped by cancellation.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_CALLS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_CALLS).decrement(1.0);
    }
}
