//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use courier_interceptor::LogLevel;
use courier_telemetry::LogFormat;
use serde::{Deserialize, Serialize};

/// Client section: addressing, timeouts and redirects.
///
/// # Example
///
/// ```
/// use courier_config::ClientSection;
///
/// let client = ClientSection {
///     base_url: "https://api.example.com/".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(client.connect_timeout_ms, 10_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    /// Base URL that relative request URLs are resolved against. Empty
    /// means requests must carry absolute URLs.
    #[serde(default)]
    pub base_url: String,

    /// Default connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Default read timeout in milliseconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,

    /// Maximum number of redirects followed per call.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// `User-Agent` sent when the request does not set one.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            connect_timeout_ms: default_connect_timeout(),
            read_timeout_ms: default_read_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_read_timeout() -> u64 {
    20_000
}

fn default_max_redirects() -> u32 {
    20
}

fn default_user_agent() -> String {
    concat!("courier/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Logging interceptor section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Whether a logging interceptor is installed at all.
    #[serde(default)]
    pub enabled: bool,

    /// Verbosity of the logging interceptor.
    #[serde(default)]
    pub level: LogLevel,
}

/// Subscriber section, consumed by `courier_telemetry::init_logging`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Filter directive, e.g. `"info"` or `"courier=debug,hyper=warn"`.
    #[serde(default = "default_telemetry_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Address for the Prometheus listener. Unset disables the exporter.
    #[serde(default)]
    pub metrics_addr: Option<String>,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            level: default_telemetry_level(),
            format: LogFormat::default(),
            metrics_addr: None,
        }
    }
}

fn default_telemetry_level() -> String {
    "info".to_string()
}

/// Public key pins for one host pattern.
///
/// ```toml
/// [[tls.pins]]
/// host = "*.example.com"
/// pins = ["sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PinEntry {
    /// Exact host or `*.`-prefixed wildcard.
    pub host: String,

    /// Pins in `sha256/<base64>` form.
    pub pins: Vec<String>,
}

/// TLS section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsSection {
    /// Trust every certificate. Local debugging only.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Certificate pins by host.
    #[serde(default)]
    pub pins: Vec<PinEntry>,
}
