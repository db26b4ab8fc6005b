//! Typed configuration for the Courier HTTP client.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (fails on unknown fields)
//! - Layered loading (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use courier_config::ConfigLoader;
//!
//! # fn main() -> Result<(), courier_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("courier.toml")?
//!     .with_env_prefix("COURIER")
//!     .load()?;
//!
//! println!("Calls go to: {}", config.client.base_url);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [client]
//! base_url = "https://api.open-meteo.com/"
//! connect_timeout_ms = 10000
//! read_timeout_ms = 20000
//! max_redirects = 20
//!
//! [headers]
//! accept-encoding = "gzip"
//!
//! [logging]
//! enabled = true
//! level = "headers"
//!
//! [telemetry]
//! level = "info"
//! format = "json"
//!
//! [tls]
//! accept_invalid_certs = false
//!
//! [[tls.pins]]
//! host = "*.open-meteo.com"
//! pins = ["sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="]
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `COURIER__CLIENT__BASE_URL=https://staging.example.com/`
//! - `COURIER__CLIENT__READ_TIMEOUT_MS=5000`
//! - `COURIER__LOGGING__LEVEL=body`
//! - `COURIER__HEADERS__X_API_KEY=secret`

#![doc(html_root_url = "https://docs.rs/courier-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::ClientConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ClientSection, LoggingSection, PinEntry, TelemetrySection, TlsSection};
