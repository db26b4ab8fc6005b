//! Root configuration type.

use crate::error::ConfigError;
use crate::schema::{ClientSection, LoggingSection, TelemetrySection, TlsSection};
use courier_telemetry::{LogConfig, MetricsConfig};
use courier_tls::{CertificatePinner, Pin};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete Courier client configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use courier_config::ClientConfig;
///
/// let config = ClientConfig::default();
/// assert_eq!(config.client.max_redirects, 20);
/// assert!(config.headers.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Addressing, timeouts and redirects.
    #[serde(default)]
    pub client: ClientSection,

    /// Default headers sent with every request.
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    /// Logging interceptor settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Subscriber and metrics exporter settings.
    #[serde(default)]
    pub telemetry: TelemetrySection,

    /// TLS trust and pinning.
    #[serde(default)]
    pub tls: TlsSection,
}

impl ClientConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `client.base_url` is set but not an absolute URL
    /// - a timeout is zero
    /// - a pin entry has a blank host or a pin that does not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.client.base_url.is_empty() {
            url::Url::parse(&self.client.base_url).map_err(|e| {
                ConfigError::invalid_value(
                    "client.base_url",
                    format!("'{}': {e}", self.client.base_url),
                )
            })?;
        }

        if self.client.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "client.connect_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.client.read_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "client.read_timeout_ms",
                "must be greater than zero",
            ));
        }

        for (index, entry) in self.tls.pins.iter().enumerate() {
            if entry.host.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("tls.pins[{index}].host"),
                    "must not be blank",
                ));
            }
            for pin in &entry.pins {
                Pin::parse(pin).map_err(|e| {
                    ConfigError::invalid_value(format!("tls.pins[{index}].pins"), e.to_string())
                })?;
            }
        }

        Ok(())
    }

    /// Development preset: verbose interceptor and pretty subscriber output.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.enabled = true;
        config.logging.level = courier_interceptor::LogLevel::Body;
        config.telemetry.level = "debug".to_string();
        config.telemetry.format = courier_telemetry::LogFormat::Pretty;
        config
    }

    /// Production preset: basic interceptor logging and JSON output.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.enabled = true;
        config.logging.level = courier_interceptor::LogLevel::Basic;
        config
    }

    /// Returns the configured connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.client.connect_timeout_ms)
    }

    /// Returns the configured read timeout.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.client.read_timeout_ms)
    }

    /// Builds the certificate pinner, or `None` when no pins are configured.
    #[must_use]
    pub fn certificate_pinner(&self) -> Option<CertificatePinner> {
        if self.tls.pins.is_empty() {
            return None;
        }
        let pinner = self
            .tls
            .pins
            .iter()
            .fold(CertificatePinner::builder(), |builder, entry| {
                builder.add(&entry.host, &entry.pins)
            })
            .build();
        Some(pinner)
    }

    /// Returns the subscriber settings for `courier_telemetry::init_logging`.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig::default().with_level_and_format(&self.telemetry.level, self.telemetry.format)
    }

    /// Returns the exporter settings for `courier_telemetry::init_metrics`,
    /// or `None` when no listener address is configured.
    #[must_use]
    pub fn metrics_config(&self) -> Option<MetricsConfig> {
        self.telemetry.metrics_addr.as_ref().map(|addr| MetricsConfig {
            listen_addr: Some(addr.clone()),
            ..MetricsConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PinEntry;

    const ZERO_PIN: &str = "sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    #[test]
    fn test_default_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let mut config = ClientConfig::default();
        config.client.base_url = "/v1/".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "client.base_url"
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ClientConfig::default();
        config.client.read_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_pin_rejected() {
        let mut config = ClientConfig::default();
        config.tls.pins.push(PinEntry {
            host: "api.example.com".to_string(),
            pins: vec!["md5/abc".to_string()],
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "tls.pins[0].pins"
        ));
    }

    #[test]
    fn test_certificate_pinner() {
        let mut config = ClientConfig::default();
        assert!(config.certificate_pinner().is_none());

        config.tls.pins.push(PinEntry {
            host: "*.example.com".to_string(),
            pins: vec![ZERO_PIN.to_string()],
        });
        let pinner = config.certificate_pinner().unwrap();
        assert!(pinner.pins_for("api.example.com").is_some());
    }

    #[test]
    fn test_presets() {
        let dev = ClientConfig::development();
        assert!(dev.logging.enabled);
        assert!(!dev.log_config().json_format);
        assert_eq!(dev.log_config().level, "debug");

        let prod = ClientConfig::production();
        assert!(prod.log_config().json_format);
        assert!(prod.metrics_config().is_none());
    }

    #[test]
    fn test_durations() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.read_timeout(), Duration::from_secs(20));
    }
}
