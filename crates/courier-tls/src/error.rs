//! Error types for TLS policy construction and pin verification.

use thiserror::Error;

/// Result type for TLS operations.
pub type TlsResult<T> = Result<T, TlsError>;

/// Errors raised while turning a [`TlsPolicy`](crate::TlsPolicy) into a
/// rustls client configuration.
#[derive(Debug, Error)]
pub enum TlsError {
    /// rustls rejected the protocol or provider selection.
    #[error("TLS configuration error: {0}")]
    Config(#[from] rustls::Error),

    /// The default certificate verifier could not be built.
    #[error("certificate verifier error: {0}")]
    Verifier(#[from] rustls::client::VerifierBuilderError),
}

/// Errors produced by certificate pinning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinError {
    /// A pin string was not of the form `sha256/<base64>`.
    #[error("invalid pin '{pin}': {reason}")]
    InvalidPin {
        /// The rejected input.
        pin: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A certificate in the peer chain could not be parsed.
    #[error("unparseable certificate: {0}")]
    BadCertificate(String),

    /// No certificate in the peer chain matched a configured pin.
    #[error(
        "Certificate pinning failure!\n  Peer: {host}\n  Pinned: {}\n  Found: {}",
        pinned.join(", "),
        found.join(", ")
    )]
    Mismatch {
        /// The host that was checked.
        host: String,
        /// The configured pins for that host.
        pinned: Vec<String>,
        /// The `sha256/…` hashes of the presented chain.
        found: Vec<String>,
    },
}

impl PinError {
    pub(crate) fn invalid(pin: &str, reason: &'static str) -> Self {
        Self::InvalidPin {
            pin: pin.to_string(),
            reason,
        }
    }

    /// Returns true if this is a pin mismatch for a pinned host.
    #[must_use]
    pub const fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}
