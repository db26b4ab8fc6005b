//! Certificate pinning.
//!
//! A [`CertificatePinner`] maps host patterns to the public key pins the
//! peer must present. After the TLS handshake the transport hashes every
//! certificate in the peer chain and requires at least one of them to match.
//!
//! # Lookup
//!
//! For a host `h` the pin set is looked up as:
//!
//! 1. the exact key `h`
//! 2. the key `*.h`
//! 3. the key `*.<parent of h>`, so `*.example.com` covers `api.example.com`
//!
//! Host keys are lowercased and trimmed on both sides of the lookup.
//!
//! # Fail-open
//!
//! Pinning is opt-in. A host with no entry, or whose pins all failed to
//! parse, is not checked at all. Pinning is only a guarantee for hosts that
//! have at least one well-formed pin.

use crate::error::PinError;
use crate::pin::Pin;
use indexmap::IndexMap;
use rustls::pki_types::CertificateDer;

/// Host-to-pins mapping checked after each TLS handshake.
///
/// # Example
///
/// ```
/// use courier_tls::CertificatePinner;
///
/// let pinner = CertificatePinner::builder()
///     .add("api.example.com", ["sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="])
///     .add("*.example.org", ["sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="])
///     .build();
///
/// assert!(pinner.pins_for("API.example.com").is_some());
/// assert!(pinner.pins_for("cdn.example.org").is_some());
/// assert!(pinner.pins_for("unpinned.test").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CertificatePinner {
    pins: IndexMap<String, Vec<Pin>>,
}

impl CertificatePinner {
    /// Creates a new pinner builder.
    #[must_use]
    pub fn builder() -> CertificatePinnerBuilder {
        CertificatePinnerBuilder::default()
    }

    /// Returns the non-empty pin set that applies to `host`, if any.
    #[must_use]
    pub fn pins_for(&self, host: &str) -> Option<&[Pin]> {
        let host = normalize(host);
        let lookup = |key: &str| self.pins.get(key).filter(|pins| !pins.is_empty());

        lookup(&host)
            .or_else(|| lookup(&format!("*.{host}")))
            .or_else(|| {
                host.split_once('.')
                    .and_then(|(_, parent)| lookup(&format!("*.{parent}")))
            })
            .map(Vec::as_slice)
    }

    /// Verifies a peer certificate chain for `host`.
    ///
    /// Succeeds when the host is unpinned or when any certificate in `chain`
    /// hashes to any configured pin. Unparseable certificates are skipped
    /// and reported as `unknown` in the mismatch diagnostics.
    pub fn check(&self, host: &str, chain: &[CertificateDer<'_>]) -> Result<(), PinError> {
        let Some(pinned) = self.pins_for(host) else {
            return Ok(());
        };

        let mut found = Vec::with_capacity(chain.len());
        for cert in chain {
            match Pin::of_certificate(cert) {
                Ok(pin) if pinned.contains(&pin) => {
                    tracing::debug!(host, pin = %pin, "Certificate pin matched");
                    return Ok(());
                }
                Ok(pin) => found.push(pin.to_string()),
                Err(_) => found.push("unknown".to_string()),
            }
        }

        Err(PinError::Mismatch {
            host: host.to_string(),
            pinned: pinned.iter().map(ToString::to_string).collect(),
            found,
        })
    }

    /// Returns the configured host patterns in insertion order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.pins.keys().map(String::as_str)
    }

    /// Returns true if no host has any pin.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pins.values().all(Vec::is_empty)
    }
}

/// Builder for [`CertificatePinner`].
#[derive(Debug, Clone, Default)]
pub struct CertificatePinnerBuilder {
    pins: IndexMap<String, Vec<Pin>>,
}

impl CertificatePinnerBuilder {
    /// Adds pins for a host or `*.`-prefixed wildcard pattern.
    ///
    /// Malformed pins are discarded with a warning. Repeated calls for the
    /// same host accumulate.
    #[must_use]
    pub fn add<I, S>(mut self, host: &str, pins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.pins.entry(normalize(host)).or_default();
        for raw in pins {
            match Pin::parse(raw.as_ref()) {
                Ok(pin) => entry.push(pin),
                Err(e) => tracing::warn!(host, error = %e, "Discarding malformed certificate pin"),
            }
        }
        self
    }

    /// Adds an already parsed pin.
    #[must_use]
    pub fn add_pin(mut self, host: &str, pin: Pin) -> Self {
        self.pins.entry(normalize(host)).or_default().push(pin);
        self
    }

    /// Freezes the pin table.
    #[must_use]
    pub fn build(self) -> CertificatePinner {
        CertificatePinner { pins: self.pins }
    }
}

fn normalize(host: &str) -> String {
    host.trim().to_ascii_lowercase()
}
