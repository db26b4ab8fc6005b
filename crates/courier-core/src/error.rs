//! Error types for Courier.
//!
//! Runtime failures never escape a call as a Rust error. They travel inside
//! the [`HttpResponse::Error`](crate::HttpResponse::Error) variant as a
//! [`CallError`], which keeps the original cause available for
//! classification.
//!
//! | Cause | Variant | Network error | Timeout |
//! |---|---|---|---|
//! | DNS resolution failed | `Transport(Dns)` | yes | no |
//! | Connection refused / reset | `Transport(Connect)` | yes | no |
//! | Connect or read deadline hit | `Transport(Timeout)` | yes | yes |
//! | Handshake or certificate rejected | `Transport(Tls)` | yes | no |
//! | Peer key matched no configured pin | `Transport(CertificatePinning)` | yes | no |
//! | Malformed HTTP exchange | `Transport(Protocol)` | yes | no |
//! | Body shape mismatch | `Decode(Json)` | no | no |
//! | Body type not decodable | `Decode(UnsupportedContentType)` | no | no |
//! | Caller dropped interest | `Cancelled` | no | no |

use std::fmt;
use thiserror::Error;

/// The kind of a transport-level failure.
///
/// The kind survives the trip through the interceptor chain alongside the
/// sentinel status so that the final outcome can still be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportFailureKind {
    /// The host name could not be resolved.
    Dns,
    /// The TCP connection could not be established or was reset.
    Connect,
    /// The connect or read timeout elapsed.
    Timeout,
    /// The TLS handshake failed or the certificate chain was rejected.
    Tls,
    /// The peer certificate chain matched none of the configured pins.
    CertificatePinning,
    /// Generic I/O failure while writing the request or reading the response.
    Io,
    /// The peer violated HTTP framing, or the request could not be encoded.
    Protocol,
    /// The redirect bound was exceeded.
    TooManyRedirects,
    /// The request URL could not be parsed or uses an unsupported scheme.
    InvalidUrl,
}

impl TransportFailureKind {
    /// Returns the stable lowercase name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Tls => "tls",
            Self::CertificatePinning => "certificate_pinning",
            Self::Io => "io",
            Self::Protocol => "protocol",
            Self::TooManyRedirects => "too_many_redirects",
            Self::InvalidUrl => "invalid_url",
        }
    }

    /// Returns true if this kind counts as a network error.
    #[must_use]
    pub const fn is_network(self) -> bool {
        !matches!(self, Self::InvalidUrl)
    }

    /// Returns true if this kind is a TLS or pinning rejection.
    #[must_use]
    pub const fn is_security(self) -> bool {
        matches!(self, Self::Tls | Self::CertificatePinning)
    }
}

impl fmt::Display for TransportFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport-level failure: no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct TransportFailure {
    kind: TransportFailureKind,
    message: String,
}

impl TransportFailure {
    /// Creates a failure of the given kind.
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a DNS resolution failure.
    pub fn dns(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Dns, message)
    }

    /// Creates a connection failure.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Connect, message)
    }

    /// Creates a timeout failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Timeout, message)
    }

    /// Creates a TLS failure.
    pub fn tls(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Tls, message)
    }

    /// Creates a certificate pinning failure.
    pub fn pinning(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::CertificatePinning, message)
    }

    /// Creates a generic I/O failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Io, message)
    }

    /// Creates a protocol failure.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Protocol, message)
    }

    /// Creates an invalid URL failure.
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::InvalidUrl, message)
    }

    /// Returns the failure kind.
    #[must_use]
    pub fn kind(&self) -> TransportFailureKind {
        self.kind
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A failure to turn a 2xx body into the requested type.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body was not valid JSON or did not match the target shape.
    #[error("failed to decode JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// The response content type cannot be decoded into the target.
    #[error("unsupported content type {content_type} for {target}")]
    UnsupportedContentType {
        /// The `Content-Type` header value, or `none`.
        content_type: String,
        /// The name of the requested target type.
        target: &'static str,
    },
}

/// The cause carried by [`HttpResponse::Error`](crate::HttpResponse::Error).
#[derive(Debug, Error)]
pub enum CallError {
    /// No HTTP response was received.
    #[error(transparent)]
    Transport(#[from] TransportFailure),

    /// A 2xx response was received but could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The caller cancelled the call while it was in flight.
    #[error("call cancelled")]
    Cancelled,
}

impl CallError {
    /// Returns the transport failure, if this is one.
    #[must_use]
    pub fn transport(&self) -> Option<&TransportFailure> {
        match self {
            Self::Transport(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns true for DNS, connection, timeout, I/O, TLS and protocol failures.
    #[must_use]
    pub fn is_network_error(&self) -> bool {
        self.transport().is_some_and(|f| f.kind().is_network())
    }

    /// Returns true if a connect or read deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.transport()
            .is_some_and(|f| f.kind() == TransportFailureKind::Timeout)
    }

    /// Returns true if the handshake or a pin check rejected the peer.
    #[must_use]
    pub fn is_security_error(&self) -> bool {
        self.transport().is_some_and(|f| f.kind().is_security())
    }

    /// Returns true if the exchange succeeded but the body could not be decoded.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns true if the call was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised while assembling a [`Request`](crate::Request).
///
/// These indicate a construction bug at the call site rather than a runtime
/// condition.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request URL was empty.
    #[error("URL cannot be empty")]
    EmptyUrl,

    /// A JSON body could not be serialized.
    #[error("failed to serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error returned by [`HttpResponse::into_result`](crate::HttpResponse::into_result).
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The peer answered with a non-2xx status.
    #[error("HTTP error {status}: {message}")]
    Http {
        /// The received status code.
        status: u16,
        /// The status message.
        message: String,
        /// The raw response text.
        body: Option<String>,
    },

    /// The call failed before a usable response was produced.
    #[error(transparent)]
    Call(#[from] CallError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_display() {
        let failure = TransportFailure::timeout("read timed out after 20000ms");
        assert_eq!(failure.to_string(), "timeout error: read timed out after 20000ms");
        assert_eq!(failure.kind(), TransportFailureKind::Timeout);
    }

    #[test]
    fn test_call_error_classification() {
        let timeout = CallError::from(TransportFailure::timeout("slow"));
        assert!(timeout.is_network_error());
        assert!(timeout.is_timeout());
        assert!(!timeout.is_security_error());

        let pinning = CallError::from(TransportFailure::pinning("no match"));
        assert!(pinning.is_network_error());
        assert!(pinning.is_security_error());
        assert!(!pinning.is_timeout());

        let bad_url = CallError::from(TransportFailure::invalid_url("nope"));
        assert!(!bad_url.is_network_error());

        assert!(!CallError::Cancelled.is_network_error());
        assert!(CallError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_decode_error_is_not_network() {
        let err = CallError::from(DecodeError::UnsupportedContentType {
            content_type: "text/html".to_string(),
            target: "Forecast",
        });
        assert!(err.is_decode_error());
        assert!(!err.is_network_error());
        assert_eq!(
            err.to_string(),
            "unsupported content type text/html for Forecast"
        );
    }

    #[test]
    fn test_request_error_display() {
        assert_eq!(RequestError::EmptyUrl.to_string(), "URL cannot be empty");
    }
}
